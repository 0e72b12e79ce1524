// SPDX-License-Identifier: MIT

//! The engine process lifecycle.

use std::io::{self, PipeReader};
use std::process::Child;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::env::EnvironmentConfig;
use super::error::LaunchError;
use super::permission::{Chmod, PermissionFacility};
use super::resource::{ENGINE_BINARY, ResourceLocator};
use super::output::{OutputReader, OutputTap, relay};
use super::spawn::{
    LaunchEnv, SpawnedEngine, exit_code, kill_and_reap, launch_child, terminate, wait_exited,
};
use super::state::{EngineState, Publisher, SupervisorEvent};
use crate::drive::{SandboxRoot, VirtualDriveBuilder};
use crate::input::{ChannelSink, NormalizedPointerEvent};

/// Owns the lifecycle of the single engine process.
///
/// All published state sits behind one lock.  Every transition and every
/// status message is published to subscribers while that lock is held, so
/// subscribers observe events in the order the transitions happened.
///
/// The supervisor is `Sync`: share it behind an `Arc` to launch and stop
/// from different threads.
pub struct EngineSupervisor {
    shared: Arc<Shared>,
    root: SandboxRoot,
    drive: VirtualDriveBuilder,
    locator: Arc<dyn ResourceLocator>,
    permissions: Arc<dyn PermissionFacility>,
    engine_name: String,
    input: ChannelSink,
    input_events: Mutex<Option<Receiver<NormalizedPointerEvent>>>,
}

impl EngineSupervisor {
    /// Create an idle supervisor for an engine running against `root`.
    ///
    /// The engine is resolved through `locator` under the name
    /// [`ENGINE_BINARY`] and made executable with the host `chmod`.
    pub fn new(
        root: SandboxRoot,
        drive: VirtualDriveBuilder,
        locator: Arc<dyn ResourceLocator>,
    ) -> Self {
        let (input, input_events) = ChannelSink::channel();
        EngineSupervisor {
            shared: Arc::new(Shared::new()),
            root,
            drive,
            locator,
            permissions: Arc::new(Chmod::new()),
            engine_name: ENGINE_BINARY.to_string(),
            input,
            input_events: Mutex::new(Some(input_events)),
        }
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionFacility>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_engine_name(mut self, name: impl Into<String>) -> Self {
        self.engine_name = name.into();
        self
    }

    pub fn sandbox_root(&self) -> &SandboxRoot {
        &self.root
    }

    pub fn state(&self) -> EngineState {
        self.shared.lock().state
    }

    pub fn status(&self) -> String {
        self.shared.lock().status.clone()
    }

    /// Receive every future state change and status message.
    pub fn subscribe(&self) -> Receiver<SupervisorEvent> {
        self.shared.lock().publisher.subscribe()
    }

    /// Tap the combined stdout/stderr stream of the engine.
    ///
    /// The supervisor always drains the stream itself and logs every line
    /// under the `engine` target; the tap receives a copy of the raw bytes
    /// from the point it is taken.  It follows the running engine, or the
    /// next one launched if none is running, and reaches end-of-file when
    /// that engine's stream closes.
    ///
    /// Returns `None` while an earlier reader is still open.
    pub fn take_output(&self) -> Option<OutputReader> {
        let mut inner = self.shared.lock();
        if inner.tap.as_ref().is_some_and(OutputTap::is_open) {
            return None;
        }
        let (mut tap, reader) = OutputTap::new();
        if let Some(generation) = inner.current {
            tap.bind(generation);
        }
        inner.tap = Some(tap);
        Some(reader)
    }

    /// A sink that forwards pointer events towards the engine.
    ///
    /// The supervisor keeps a sender of its own, so the receiver from
    /// [`take_input_events`](Self::take_input_events) disconnects only once
    /// the supervisor and every sink handed out here are dropped.
    pub fn input_sink(&self) -> ChannelSink {
        self.input.clone()
    }

    /// Take the receiving end of the pointer event channel.  Only the first
    /// call returns the receiver.
    pub fn take_input_events(&self) -> Option<Receiver<NormalizedPointerEvent>> {
        self.input_events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Launch the engine.
    ///
    /// Runs in order: locate the engine binary, mark it executable, make sure
    /// the sandbox layout exists, build the environment, spawn the process,
    /// and start the output relay and the exit watcher.  A failing step returns the supervisor to
    /// [`EngineState::Idle`].
    ///
    /// Returns [`LaunchError::AlreadyActive`] without any other effect while a
    /// launch is in progress or an engine is running.
    pub fn launch(&self) -> Result<(), LaunchError> {
        {
            let mut inner = self.shared.lock();
            if inner.state.is_active() {
                debug!("Launch rejected, engine is {}", inner.state);
                return Err(LaunchError::AlreadyActive);
            }
            inner.transition(EngineState::Launching, "Launching Windows engine...");
        }

        self.launch_steps().inspect_err(|err| {
            warn!("Engine launch failed: {err}");
            self.shared
                .lock()
                .transition(EngineState::Idle, format!("Launch failed: {err}"));
        })
    }

    fn launch_steps(&self) -> Result<(), LaunchError> {
        let engine = self.locator.locate(&self.engine_name).ok_or_else(|| {
            LaunchError::EngineBinaryNotFound {
                name: self.engine_name.clone(),
            }
        })?;
        self.shared
            .status(format!("Found {} at {}", self.engine_name, engine.display()));

        match self.permissions.make_executable(&engine) {
            Ok(0) => {}
            Ok(code) => {
                return Err(LaunchError::PermissionDenied {
                    path: engine,
                    status: Some(code),
                    source: None,
                });
            }
            Err(err) => {
                return Err(LaunchError::PermissionDenied {
                    path: engine,
                    status: None,
                    source: Some(err),
                });
            }
        }
        self.shared.status("Execute permissions set");

        let shared = self.shared.clone();
        self.drive
            .clone()
            .with_progress(move |step| shared.status(step.status()))
            .ensure_layout(&self.root)?;
        self.shared.status("Wine environment ready");

        let env = EnvironmentConfig::for_sandbox(&self.root);
        let spawned = launch_child(LaunchEnv {
            cmd: engine.clone(),
            args: Vec::new(),
            cwd: self.root.path().to_path_buf(),
            env,
        })
        .map_err(|source| LaunchError::SpawnFailed {
            path: engine.clone(),
            source,
        })?;

        let SpawnedEngine { mut child, output } = spawned;
        let pid = child.id();
        let generation = {
            let mut inner = self.shared.lock();
            inner.generation += 1;
            let generation = inner.generation;
            inner.current = Some(generation);
            if let Some(tap) = inner.tap.as_mut() {
                tap.bind(generation);
            }
            inner.transition(
                EngineState::Running { pid },
                format!("Windows engine launched (pid {pid})"),
            );
            generation
        };
        info!("Engine {} running as pid {pid}", engine.display());

        let shared = self.shared.clone();
        let relay_thread = std::thread::Builder::new()
            .name(format!("engine-output-{pid}"))
            .spawn(move || drain(shared, generation, output));
        if let Err(source) = relay_thread {
            if let Err(err) = child.kill().and_then(|()| child.wait().map(drop)) {
                warn!("Failed to take down engine pid {pid}: {err}");
            }
            self.shared.abandon(generation);
            return Err(LaunchError::SpawnFailed {
                path: engine,
                source,
            });
        }

        let shared = self.shared.clone();
        let watch_thread = std::thread::Builder::new()
            .name(format!("engine-watch-{pid}"))
            .spawn(move || watch(shared, generation, child));
        if let Err(source) = watch_thread {
            // The closure, and the child with it, is gone; nobody else reaps.
            if let Err(err) = kill_and_reap(pid) {
                warn!("Failed to take down engine pid {pid}: {err}");
            }
            self.shared.abandon(generation);
            return Err(LaunchError::SpawnFailed {
                path: engine,
                source,
            });
        }
        Ok(())
    }

    /// Request termination of the running engine.
    ///
    /// Does nothing unless the engine is running.  Otherwise the process is
    /// signalled and the supervisor returns to [`EngineState::Idle`] at once,
    /// without waiting for the process.  The signal is sent under the lock
    /// the watcher reaps under, so it cannot reach a recycled pid.
    pub fn stop(&self) {
        let mut inner = self.shared.lock();
        let EngineState::Running { pid } = inner.state else {
            return;
        };
        inner.transition(EngineState::Exiting { pid }, "Stopping engine...");
        if let Err(err) = terminate(pid) {
            warn!("Failed to signal engine: {err}");
        }
        inner.current = None;
        inner.transition(EngineState::Idle, "Engine stopped");
        self.shared.settled.notify_all();
        info!("Engine pid {pid} stopped");
    }

    /// Block until no engine is launching or running, or until `timeout`
    /// passes.  Returns the exit code if the engine exited on its own.
    pub fn wait_for_exit(&self, timeout: Duration) -> Option<i32> {
        let inner = self.shared.lock();
        let (inner, _) = self
            .shared
            .settled
            .wait_timeout_while(inner, timeout, |inner| inner.state.is_active())
            .unwrap_or_else(PoisonError::into_inner);
        match inner.state {
            EngineState::Exited { code } => Some(code),
            _ => None,
        }
    }
}

impl Drop for EngineSupervisor {
    fn drop(&mut self) {
        // Don't leave the engine running without anyone able to stop it.
        self.stop();
    }
}

/// Blocks on the process exit, then reaps and reports it under the lock.
fn watch(shared: Arc<Shared>, generation: u64, mut child: Child) {
    let pid = child.id();
    // Leave the exited process unreaped so its pid stays reserved until the
    // lock is held.  Where that is unsupported, reap right away.
    let early = match wait_exited(pid) {
        Ok(()) => None,
        Err(err) => {
            if err.kind() != io::ErrorKind::Unsupported {
                warn!("Failed waiting for engine pid {pid}: {err}");
            }
            Some(reap(&mut child))
        }
    };

    let mut inner = shared.lock();
    let code = early.unwrap_or_else(|| reap(&mut child));
    if inner.current != Some(generation) {
        debug!("Ignoring exit {code} of a replaced engine");
        return;
    }
    inner.current = None;
    let status = if code == 0 {
        "Engine completed successfully".to_string()
    } else {
        format!("Engine exited with code: {code}")
    };
    info!("{status}");
    inner.transition(EngineState::Exited { code }, status);
    shared.settled.notify_all();
}

fn reap(child: &mut Child) -> i32 {
    match child.wait() {
        Ok(status) => exit_code(status),
        Err(err) => {
            warn!("Failed waiting for engine: {err}");
            -1
        }
    }
}

/// Reads the engine's output to the end, feeding the tap bound to it.
fn drain(shared: Arc<Shared>, generation: u64, output: PipeReader) {
    let res = relay(output, |chunk| {
        let mut inner = shared.lock();
        let delivered = match inner.tap.as_ref() {
            Some(tap) if tap.is_for(generation) => tap.send(chunk),
            _ => true,
        };
        if !delivered {
            inner.tap = None;
        }
    });
    if let Err(err) = res {
        warn!("Failed reading engine output: {err}");
    }
    shared.close_tap(generation);
}

struct Shared {
    inner: Mutex<Inner>,
    /// Signalled whenever the state leaves launching/running.
    settled: Condvar,
}

impl Shared {
    fn new() -> Self {
        Shared {
            inner: Mutex::new(Inner {
                state: EngineState::Idle,
                status: "Ready to launch Windows".to_string(),
                generation: 0,
                current: None,
                tap: None,
                publisher: Publisher::default(),
            }),
            settled: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget a process whose threads could not be started.
    fn abandon(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.current == Some(generation) {
            inner.current = None;
        }
        drop(inner);
        self.close_tap(generation);
    }

    /// End the tap bound to `generation`, if any.
    fn close_tap(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.tap.as_ref().is_some_and(|tap| tap.is_for(generation)) {
            inner.tap = None;
        }
    }

    /// Publish a progress message without changing state.
    fn status(&self, status: impl Into<String>) {
        let mut inner = self.lock();
        let state = inner.state;
        inner.transition(state, status);
    }
}

struct Inner {
    state: EngineState,
    status: String,
    /// Incremented on every successful spawn.
    generation: u64,
    /// Generation of the live process, if any.
    current: Option<u64>,
    /// Where a copy of the output goes, if anyone asked.
    tap: Option<OutputTap>,
    publisher: Publisher,
}

impl Inner {
    fn transition(&mut self, state: EngineState, status: impl Into<String>) {
        self.state = state;
        self.status = status.into();
        debug!("Engine {}: {}", self.state, self.status);
        let event = SupervisorEvent {
            state: self.state,
            status: self.status.clone(),
        };
        self.publisher.publish(&event);
    }
}
