// SPDX-License-Identifier: MIT

//! Materialize the drive layout.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::BootstrapError;
use super::layout::SandboxRoot;
use super::link::replace_link;
use super::registry::{SYSTEM_REG_CONTENT, write_atomic};
use crate::dirs::SpecialDirs;

/// Outcome of a successful [`VirtualDriveBuilder::ensure_layout`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStatus {
    /// The primary system subtree was already present; nothing was touched.
    AlreadyInitialized,
    /// The full layout, removable drive link, and configuration were written.
    Initialized,
}

/// Progress notifications emitted while a full bootstrap runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStep {
    CreatingDirectories,
    CreatedDirectory(PathBuf),
    LinkingRemovableDrive,
    WritingConfig,
}

impl BootstrapStep {
    /// Human readable status line for presentation.
    pub fn status(&self) -> String {
        match self {
            BootstrapStep::CreatingDirectories => {
                "Creating Windows directory structure...".to_string()
            }
            BootstrapStep::CreatedDirectory(path) => format!("Created {}", path.display()),
            BootstrapStep::LinkingRemovableDrive => "Creating D: drive link...".to_string(),
            BootstrapStep::WritingConfig => "Writing system.reg...".to_string(),
        }
    }
}

type ProgressFn = dyn Fn(&BootstrapStep) + Send + Sync;

/// Creates the emulated drive tree below a sandbox root.
#[derive(Clone)]
pub struct VirtualDriveBuilder {
    dirs: Arc<dyn SpecialDirs>,
    progress: Option<Arc<ProgressFn>>,
}

impl VirtualDriveBuilder {
    /// Create a builder that resolves the removable drive target through `dirs`.
    pub fn new(dirs: Arc<dyn SpecialDirs>) -> Self {
        VirtualDriveBuilder {
            dirs,
            progress: None,
        }
    }

    /// Report every bootstrap step to `progress`.
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(&BootstrapStep) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Make sure the drive layout exists below `root`.
    ///
    /// When the primary system subtree already exists, this returns
    /// [`LayoutStatus::AlreadyInitialized`] without looking at anything else,
    /// even if other parts of the layout are missing.
    ///
    /// Otherwise every layout directory is created, the removable drive link
    /// is recreated, and `system.reg` is rewritten.  Any failure stops the
    /// bootstrap; work done before the failure is left in place.
    pub fn ensure_layout(&self, root: &SandboxRoot) -> Result<LayoutStatus, BootstrapError> {
        if root.primary_subtree().exists() {
            debug!("Drive layout already present at {}", root.path().display());
            return Ok(LayoutStatus::AlreadyInitialized);
        }

        info!("Bootstrapping drive layout at {}", root.path().display());
        self.report(BootstrapStep::CreatingDirectories);
        for dir in root.required_directories() {
            fs_err::create_dir_all(&dir).map_err(|source| {
                warn!("Failed to create {}: {source}", dir.display());
                BootstrapError::DirectoryCreationFailed {
                    path: dir.clone(),
                    source,
                }
            })?;
            debug!("Created {}", dir.display());
            self.report(BootstrapStep::CreatedDirectory(dir));
        }

        self.report(BootstrapStep::LinkingRemovableDrive);
        self.link_removable_drive(root)?;

        self.report(BootstrapStep::WritingConfig);
        let reg = root.system_reg();
        write_atomic(&reg, SYSTEM_REG_CONTENT).map_err(|source| {
            warn!("Failed to write {}: {source}", reg.display());
            BootstrapError::ConfigWriteFailed { path: reg, source }
        })?;
        debug!("Wrote {}", root.system_reg().display());

        info!("Drive layout ready at {}", root.path().display());
        Ok(LayoutStatus::Initialized)
    }

    /// Whether the system drive and the public desktop both exist.
    pub fn is_ready(root: &SandboxRoot) -> bool {
        root.system_drive().is_dir() && root.desktop().is_dir()
    }

    fn link_removable_drive(&self, root: &SandboxRoot) -> Result<(), BootstrapError> {
        let Some(downloads) = self.dirs.downloads_dir() else {
            warn!("Host downloads directory is unavailable; D: drive not linked");
            return Err(BootstrapError::RemovableMediaUnavailable);
        };
        let link = root.removable_drive();
        replace_link(&downloads, &link).map_err(|source| {
            warn!("Failed to link {}: {source}", link.display());
            BootstrapError::RemovableMediaLinkFailed {
                path: link.clone(),
                source,
            }
        })?;
        debug!("Linked {} to {}", link.display(), downloads.display());
        Ok(())
    }

    fn report(&self, step: BootstrapStep) {
        if let Some(progress) = &self.progress {
            progress(&step);
        }
    }
}

impl std::fmt::Debug for VirtualDriveBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualDriveBuilder")
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}
