// SPDX-License-Identifier: MIT

//! The launcher configuration file.
//!
//! Every key is optional:
//!
//! ```toml
//! sandbox-root = "/home/me/Documents/wine"
//! resource-dir = "/opt/winkor/resources"
//! engine-name = "winkor_engine"
//! downloads-dir = "/home/me/Downloads"
//! tap-release-ms = 100
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::dirs::{FixedDirs, HostDirs, SpecialDirs};
use crate::drive::{SandboxRoot, VirtualDriveBuilder};
use crate::input::{Clock, DEFAULT_TAP_RELEASE, EventSink, InputBridge};
use crate::runtime::{BundleDir, ENGINE_BINARY, EngineSupervisor, ResourceLocator, SearchPath};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse `{}`", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
    #[error("Could not determine the documents folder; set `sandbox-root`")]
    NoSandboxRoot,
    #[error("Invalid sandbox root `{}`", path.display())]
    InvalidSandboxRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LauncherConfig {
    /// Defaults to `wine` in the host documents folder.
    pub sandbox_root: Option<PathBuf>,
    /// Where the packaged engine lives.  Without it the engine is looked up
    /// on `PATH`.
    pub resource_dir: Option<PathBuf>,
    pub engine_name: String,
    /// Target of the removable drive link, instead of the host downloads
    /// folder.
    pub downloads_dir: Option<PathBuf>,
    pub tap_release_ms: u64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        LauncherConfig {
            sandbox_root: None,
            resource_dir: None,
            engine_name: ENGINE_BINARY.to_string(),
            downloads_dir: None,
            tap_release_ms: DEFAULT_TAP_RELEASE.as_millis() as u64,
        }
    }
}

impl LauncherConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs_err::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn tap_release(&self) -> Duration {
        Duration::from_millis(self.tap_release_ms)
    }

    /// Host folders, with the configured downloads override applied.
    pub fn special_dirs(&self) -> Arc<dyn SpecialDirs> {
        match &self.downloads_dir {
            Some(downloads) => Arc::new(FixedDirs {
                documents: HostDirs.documents_dir(),
                downloads: Some(downloads.clone()),
            }),
            None => Arc::new(HostDirs),
        }
    }

    pub fn sandbox_root(&self, dirs: &dyn SpecialDirs) -> Result<SandboxRoot, ConfigError> {
        match &self.sandbox_root {
            Some(path) => {
                SandboxRoot::new(path).map_err(|source| ConfigError::InvalidSandboxRoot {
                    path: path.clone(),
                    source,
                })
            }
            None => SandboxRoot::default_location(dirs).ok_or(ConfigError::NoSandboxRoot),
        }
    }

    pub fn locator(&self) -> Arc<dyn ResourceLocator> {
        match &self.resource_dir {
            Some(dir) => Arc::new(BundleDir::new(dir)),
            None => Arc::new(SearchPath),
        }
    }

    /// A pointer bridge using the configured tap release delay.
    pub fn input_bridge<S: EventSink, C: Clock>(&self, sink: S, clock: C) -> InputBridge<S, C> {
        InputBridge::with_clock(sink, clock).with_tap_release(self.tap_release())
    }

    /// An idle supervisor wired up from this configuration.
    pub fn supervisor(&self) -> Result<EngineSupervisor, ConfigError> {
        let dirs = self.special_dirs();
        let root = self.sandbox_root(&*dirs)?;
        Ok(
            EngineSupervisor::new(root, VirtualDriveBuilder::new(dirs), self.locator())
                .with_engine_name(&self.engine_name),
        )
    }
}
