// SPDX-License-Identifier: MIT

//! Spawning the engine process and signalling it.

use std::ffi::OsString;
use std::io::{self, PipeReader};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::waitpid;
use nix::unistd::Pid;
use tracing::debug;

use super::env::EnvironmentConfig;

/// Describes how to launch the engine process.
#[derive(Debug, Clone)]
pub struct LaunchEnv {
    pub cmd: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
    pub env: EnvironmentConfig,
}

/// A freshly spawned engine.
pub(crate) struct SpawnedEngine {
    pub child: Child,
    /// Read end of the pipe shared by the child's stdout and stderr.
    pub output: PipeReader,
}

/// Spawn the process described by `env`.
///
/// The child sees exactly the variables in `env.env`, reads stdin from the
/// null device, and writes stdout and stderr into one pipe.  The parent's
/// copies of the write end are closed before this returns, so the reader sees
/// end-of-file once the child and its descendants exit.
pub(crate) fn launch_child(env: LaunchEnv) -> io::Result<SpawnedEngine> {
    let (output, stdout) = io::pipe()?;
    let stderr = stdout.try_clone()?;

    let mut command = Command::new(&env.cmd);
    command
        .args(&env.args)
        .current_dir(&env.cwd)
        .env_clear()
        .envs(env.env.iter())
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr);
    let child = command.spawn()?;
    // Releases the write ends held by the command.
    drop(command);

    debug!("Spawned {} as pid {}", env.cmd.display(), child.id());
    Ok(SpawnedEngine { child, output })
}

/// Convert an exit status into a single code.  Death by signal `n` is
/// reported as `128 + n`, as shells do.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    use std::os::unix::process::ExitStatusExt as _;
    match status.signal() {
        Some(signal) => 128 + signal,
        None => -1,
    }
}

fn nix_pid(pid: u32) -> io::Result<Pid> {
    let raw = i32::try_from(pid).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    Ok(Pid::from_raw(raw))
}

/// Ask the process to terminate.  Does not wait for it.
pub(crate) fn terminate(pid: u32) -> io::Result<()> {
    kill(nix_pid(pid)?, Signal::SIGTERM)
        .map_err(|e| io::Error::other(format!("failed terminating pid {pid}: {e}")))
}

/// Kill the process outright and reap it.  For a child whose handle is gone.
pub(crate) fn kill_and_reap(pid: u32) -> io::Result<()> {
    let pid = nix_pid(pid)?;
    kill(pid, Signal::SIGKILL)?;
    loop {
        match waitpid(pid, None) {
            Err(Errno::EINTR) => continue,
            res => return res.map(drop).map_err(io::Error::from),
        }
    }
}

/// Block until the process has exited without reaping it, so its pid stays
/// reserved until the caller waits on the handle.
#[cfg(any(
    target_os = "android",
    target_os = "freebsd",
    all(target_os = "linux", not(target_env = "uclibc")),
))]
pub(crate) fn wait_exited(pid: u32) -> io::Result<()> {
    use nix::sys::wait::{Id, WaitPidFlag, waitid};

    let pid = nix_pid(pid)?;
    loop {
        match waitid(Id::Pid(pid), WaitPidFlag::WEXITED | WaitPidFlag::WNOWAIT) {
            Err(Errno::EINTR) => continue,
            res => return res.map(drop).map_err(io::Error::from),
        }
    }
}

#[cfg(not(any(
    target_os = "android",
    target_os = "freebsd",
    all(target_os = "linux", not(target_env = "uclibc")),
)))]
pub(crate) fn wait_exited(_pid: u32) -> io::Result<()> {
    Err(io::ErrorKind::Unsupported.into())
}
