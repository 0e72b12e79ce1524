// SPDX-License-Identifier: MIT

//! Marking the engine binary executable.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use super::spawn::exit_code;

/// The host facility that changes file permissions.
pub trait PermissionFacility: Send + Sync {
    /// Mark `path` executable and return the facility's exit code.
    /// Zero means success.
    fn make_executable(&self, path: &Path) -> io::Result<i32>;
}

/// Runs the host `chmod +x`.
#[derive(Debug, Clone)]
pub struct Chmod {
    program: PathBuf,
}

impl Chmod {
    /// Use the `chmod` found on the `PATH`, falling back to `/bin/chmod`.
    pub fn new() -> Self {
        let program = which::which("chmod").unwrap_or_else(|_| PathBuf::from("/bin/chmod"));
        Chmod { program }
    }

    /// Use a specific `chmod` program.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Chmod {
            program: program.into(),
        }
    }
}

impl Default for Chmod {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionFacility for Chmod {
    fn make_executable(&self, path: &Path) -> io::Result<i32> {
        debug!("Running {} +x {}", self.program.display(), path.display());
        let status = Command::new(&self.program)
            .arg("+x")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        Ok(exit_code(status))
    }
}
