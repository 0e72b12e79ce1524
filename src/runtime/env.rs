// SPDX-License-Identifier: MIT

//! Environment handed to the engine process.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

use crate::drive::SandboxRoot;

/// Variable pointing the engine at the sandbox root.
pub const PREFIX_VAR: &str = "WINEPREFIX";

/// Fixed performance and compatibility flags for the translation layers.
pub const ENGINE_FLAGS: &[(&str, &str)] = &[
    // Dynamic recompilation.
    ("BOX64_DYNAREC", "1"),
    // 16K page alignment.
    ("BOX64_PAGE16K", "1"),
    ("MVK_CONFIG_RESUME_MODIFY_DEFAULT_PIPELINE_CACHE", "1"),
    ("MVK_CONFIG_USE_METAL_ARGUMENT_BUFFERS", "1"),
    ("DXVK_HUD", "compiler"),
    ("MVK_CONFIG_SYNC_DISPLAY_BUFFER_UPDATES", "1"),
];

/// Immutable variable set for one engine launch.
///
/// This is the complete environment of the engine: nothing is inherited from
/// the supervising process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    vars: BTreeMap<&'static str, OsString>,
}

impl EnvironmentConfig {
    /// Build the environment for an engine running against `root`.
    pub fn for_sandbox(root: &SandboxRoot) -> Self {
        let mut vars: BTreeMap<&'static str, OsString> = ENGINE_FLAGS
            .iter()
            .map(|(key, value)| (*key, OsString::from(value)))
            .collect();
        vars.insert(PREFIX_VAR, root.path().as_os_str().to_owned());
        EnvironmentConfig { vars }
    }

    pub fn get(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(key).map(OsString::as_os_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &OsStr)> + '_ {
        self.vars.iter().map(|(key, value)| (*key, value.as_os_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
