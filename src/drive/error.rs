// SPDX-License-Identifier: MIT

//! Bootstrap failures.

use std::io;
use std::path::PathBuf;

/// Error returned when the drive layout could not be fully bootstrapped.
///
/// Nothing is rolled back: directories created before the failure stay in
/// place.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Failed to create directory `{}`", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not resolve the host downloads directory for the removable drive")]
    RemovableMediaUnavailable,
    #[error("Failed to link the removable drive at `{}`", path.display())]
    RemovableMediaLinkFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write configuration file `{}`", path.display())]
    ConfigWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
