//! Launch failures.
//!

use std::io;
use std::path::PathBuf;

use crate::drive::BootstrapError;

/// Error returned by [`EngineSupervisor::launch`](super::EngineSupervisor::launch).
///
/// Every variant aborts only the current launch attempt.  Except for
/// [`LaunchError::AlreadyActive`], the supervisor is back to idle when the
/// error is returned.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Could not find the engine binary `{name}`")]
    EngineBinaryNotFound { name: String },
    #[error("Failed to mark `{}` as executable{}", path.display(), exit_suffix(*status))]
    PermissionDenied {
        path: PathBuf,
        status: Option<i32>,
        #[source]
        source: Option<io::Error>,
    },
    #[error("Failed to set up the sandbox environment")]
    EnvironmentSetupFailed(#[from] BootstrapError),
    #[error("Failed to spawn `{}`", path.display())]
    SpawnFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("The engine is already running")]
    AlreadyActive,
}

fn exit_suffix(status: Option<i32>) -> String {
    match status {
        Some(code) => format!(" (exit code {code})"),
        None => String::new(),
    }
}
