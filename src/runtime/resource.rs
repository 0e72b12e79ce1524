// SPDX-License-Identifier: MIT

//! Locating the packaged engine binary.

use std::path::PathBuf;

/// Name of the packaged engine binary.
pub const ENGINE_BINARY: &str = "winkor_engine";

/// Resolves packaged resources by name.
pub trait ResourceLocator: Send + Sync {
    /// The path of the named resource, or `None` if it is not packaged.
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

/// Resources stored as plain files in one directory.
#[derive(Debug, Clone)]
pub struct BundleDir {
    root: PathBuf,
}

impl BundleDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BundleDir { root: root.into() }
    }
}

impl ResourceLocator for BundleDir {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        let path = self.root.join(name);
        path.is_file().then_some(path)
    }
}

/// Resources installed as executables on the `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPath;

impl ResourceLocator for SearchPath {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}
