// SPDX-License-Identifier: MIT

//! The fixed shape of the emulated drive tree.

use std::path::{Path, PathBuf};

use crate::dirs::SpecialDirs;

/// Name of the emulated system drive directory.
pub const SYSTEM_DRIVE: &str = "drive_c";

/// The primary system subtree.  Its presence marks the layout as initialized.
pub const PRIMARY_SUBTREE: &str = "drive_c/windows";

/// Device map directory holding the drive letter links.
pub const DEVICE_MAP: &str = "dosdevices";

/// Drive letter entry of the removable drive inside the device map.
pub const REMOVABLE_DRIVE: &str = "d:";

/// Name of the static configuration file at the sandbox root.
pub const SYSTEM_REG: &str = "system.reg";

/// Public desktop folder, as seen from the sandbox root.
pub const PUBLIC_DESKTOP: &str = "drive_c/users/Public/Desktop";

/// Name of the sandbox directory created below the documents folder.
pub const DEFAULT_PREFIX_NAME: &str = "wine";

/// Every directory of the drive layout, relative to the sandbox root.
///
/// Parents are listed before their children.
pub const REQUIRED_DIRECTORIES: [&str; 14] = [
    "drive_c/windows",
    "drive_c/windows/system32",
    "drive_c/windows/Fonts",
    "drive_c/users",
    "drive_c/users/Program Files",
    "drive_c/users/Program Files (x86)",
    "drive_c/users/Public",
    "drive_c/users/Public/Desktop",
    "drive_c/users/Public/Documents",
    "drive_c/users/Public/Downloads",
    "drive_c/users/ProgramData",
    "drive_c/temp",
    "drive_c/Program Files",
    "drive_c/Program Files (x86)",
];

/// Absolute path of the private directory that owns the whole sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SandboxRoot {
    path: PathBuf,
}

impl SandboxRoot {
    /// Wrap the given directory.  Relative paths are made absolute against
    /// the current working directory.
    pub fn new(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = std::path::absolute(path.into())?;
        Ok(SandboxRoot { path })
    }

    /// The default sandbox location, `<documents>/wine`.
    pub fn default_location(dirs: &dyn SpecialDirs) -> Option<Self> {
        dirs.documents_dir()
            .filter(|dir| dir.is_absolute())
            .map(|dir| SandboxRoot {
                path: dir.join(DEFAULT_PREFIX_NAME),
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn system_drive(&self) -> PathBuf {
        self.path.join(SYSTEM_DRIVE)
    }

    pub fn primary_subtree(&self) -> PathBuf {
        self.path.join(PRIMARY_SUBTREE)
    }

    pub fn device_map(&self) -> PathBuf {
        self.path.join(DEVICE_MAP)
    }

    /// Location of the removable drive link.
    pub fn removable_drive(&self) -> PathBuf {
        self.device_map().join(REMOVABLE_DRIVE)
    }

    pub fn system_reg(&self) -> PathBuf {
        self.path.join(SYSTEM_REG)
    }

    pub fn desktop(&self) -> PathBuf {
        self.path.join(PUBLIC_DESKTOP)
    }

    /// Absolute paths of every required layout directory, in creation order.
    pub fn required_directories(&self) -> impl Iterator<Item = PathBuf> + '_ {
        REQUIRED_DIRECTORIES.iter().map(|dir| self.path.join(dir))
    }
}

impl AsRef<Path> for SandboxRoot {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}
