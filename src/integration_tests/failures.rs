//! Launch attempts that fail part way and must leave the supervisor idle.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dirs::FixedDirs;
use crate::drive::{BootstrapError, VirtualDriveBuilder};
use crate::runtime::{EngineState, LaunchError, PermissionFacility, ResourceLocator};
use crate::EngineSupervisor;

use super::util::Sandbox;

/// Answers every chmod request the same way.
struct FixedPermission(Option<i32>);

impl PermissionFacility for FixedPermission {
    fn make_executable(&self, _path: &Path) -> io::Result<i32> {
        match self.0 {
            Some(code) => Ok(code),
            None => Err(io::Error::new(io::ErrorKind::PermissionDenied, "refused")),
        }
    }
}

/// Claims the engine lives at a fixed path.
struct FixedLocation(PathBuf);

impl ResourceLocator for FixedLocation {
    fn locate(&self, _name: &str) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

fn assert_back_to_idle(supervisor: &EngineSupervisor) {
    assert_eq!(supervisor.state(), EngineState::Idle);
    assert!(
        supervisor.status().starts_with("Launch failed: "),
        "{}",
        supervisor.status()
    );
}

#[test]
fn missing_engine_binary() {
    let sandbox = Sandbox::new();
    let supervisor = sandbox.supervisor();
    let rx = supervisor.subscribe();

    let err = supervisor.launch().unwrap_err();
    assert!(
        matches!(&err, LaunchError::EngineBinaryNotFound { name } if name == "winkor_engine"),
        "{err:?}"
    );
    assert_back_to_idle(&supervisor);

    let events: Vec<_> = rx.try_iter().collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].state, EngineState::Launching);
    assert_eq!(events[1].state, EngineState::Idle);
    assert_eq!(events[1].status, format!("Launch failed: {err}"));
    assert!(!sandbox.root.system_drive().exists());
}

#[test]
fn engine_name_is_configurable() {
    let sandbox = Sandbox::new();
    let supervisor = sandbox.supervisor().with_engine_name("other_engine");
    let err = supervisor.launch().unwrap_err();
    assert!(
        matches!(&err, LaunchError::EngineBinaryNotFound { name } if name == "other_engine"),
        "{err:?}"
    );
}

#[test]
fn chmod_exit_code_is_reported() {
    let sandbox = Sandbox::new();
    let engine = sandbox.install_engine("exit 0");
    let supervisor = sandbox
        .supervisor()
        .with_permissions(Arc::new(FixedPermission(Some(1))));

    let err = supervisor.launch().unwrap_err();
    assert!(
        matches!(
            &err,
            LaunchError::PermissionDenied { path, status: Some(1), source: None } if *path == engine
        ),
        "{err:?}"
    );
    assert_back_to_idle(&supervisor);
    // Nothing past the permission step ran.
    assert!(!sandbox.root.system_drive().exists());
}

#[test]
fn chmod_that_cannot_run_is_reported() {
    let sandbox = Sandbox::new();
    sandbox.install_engine("exit 0");
    let supervisor = sandbox
        .supervisor()
        .with_permissions(Arc::new(FixedPermission(None)));

    let err = supervisor.launch().unwrap_err();
    assert!(
        matches!(&err, LaunchError::PermissionDenied { status: None, source: Some(_), .. }),
        "{err:?}"
    );
    assert_back_to_idle(&supervisor);
}

#[test]
fn missing_downloads_folder_fails_setup() {
    let sandbox = Sandbox::new();
    sandbox.install_engine("exit 0");
    let supervisor = sandbox.supervisor_with(FixedDirs {
        downloads: None,
        ..sandbox.dirs()
    });

    let err = supervisor.launch().unwrap_err();
    assert!(
        matches!(
            &err,
            LaunchError::EnvironmentSetupFailed(BootstrapError::RemovableMediaUnavailable)
        ),
        "{err:?}"
    );
    assert_back_to_idle(&supervisor);
    // Directories created before the failure stay behind.
    assert!(sandbox.root.primary_subtree().is_dir());
    assert!(!sandbox.root.system_reg().exists());
}

#[test]
fn spawn_failure_is_reported() {
    let sandbox = Sandbox::new();
    let missing = sandbox.scratch("no-such-engine");
    let supervisor = EngineSupervisor::new(
        sandbox.root.clone(),
        VirtualDriveBuilder::new(Arc::new(sandbox.dirs())),
        Arc::new(FixedLocation(missing.clone())),
    )
    .with_permissions(Arc::new(FixedPermission(Some(0))));

    let err = supervisor.launch().unwrap_err();
    assert!(
        matches!(&err, LaunchError::SpawnFailed { path, .. } if *path == missing),
        "{err:?}"
    );
    assert_back_to_idle(&supervisor);
    // Setup finished before the spawn was tried.
    assert!(sandbox.root.system_reg().is_file());
}

/// A failed launch does not block the next one.
#[test]
fn launch_after_failure() {
    let sandbox = Sandbox::new();
    let supervisor = sandbox.supervisor();
    assert!(supervisor.launch().is_err());

    sandbox.install_engine("exit 5");
    supervisor.launch().unwrap();
    assert_eq!(supervisor.wait_for_exit(super::util::PATIENCE), Some(5));
}
