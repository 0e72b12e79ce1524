// SPDX-License-Identifier: MIT

//! Host special-directory resolution.
//!
//! The sandbox lives under the user's documents folder by default, and the
//! removable drive link points at the user's downloads folder.  Both are
//! resolved through the [`SpecialDirs`] trait so that callers (and tests) can
//! substitute their own locations.

use std::path::PathBuf;

/// Resolves the host folders the sandbox depends on.
pub trait SpecialDirs: Send + Sync {
    /// The folder holding the user's documents, if one can be determined.
    fn documents_dir(&self) -> Option<PathBuf>;

    /// The folder receiving the user's downloads, if one can be determined.
    fn downloads_dir(&self) -> Option<PathBuf>;
}

/// Environment variable overriding the documents folder.
pub const XDG_DOCUMENTS_DIR: &str = "XDG_DOCUMENTS_DIR";

/// Environment variable overriding the downloads folder.
pub const XDG_DOWNLOAD_DIR: &str = "XDG_DOWNLOAD_DIR";

/// Special directories of the current host user.
///
/// This follows, in order:
///
/// - the `XDG_*_DIR` variable, when set to an absolute path
/// - `$HOME/Documents` or `$HOME/Downloads`
///
/// Returns `None` if `$HOME` cannot be resolved.  Does not check whether the
/// directory exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostDirs;

impl SpecialDirs for HostDirs {
    fn documents_dir(&self) -> Option<PathBuf> {
        user_dir(XDG_DOCUMENTS_DIR, "Documents")
    }

    fn downloads_dir(&self) -> Option<PathBuf> {
        user_dir(XDG_DOWNLOAD_DIR, "Downloads")
    }
}

/// Fixed special directories, for configuration overrides and tests.
#[derive(Debug, Clone, Default)]
pub struct FixedDirs {
    pub documents: Option<PathBuf>,
    pub downloads: Option<PathBuf>,
}

impl SpecialDirs for FixedDirs {
    fn documents_dir(&self) -> Option<PathBuf> {
        self.documents.clone()
    }

    fn downloads_dir(&self) -> Option<PathBuf> {
        self.downloads.clone()
    }
}

fn user_dir(var: &str, fallback: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .map(PathBuf::from)
        .filter(|path| path.is_absolute())
        .or_else(|| etcetera::home_dir().ok().map(|home| home.join(fallback)))
}
