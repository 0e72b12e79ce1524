//! Utility helpers for running the tests.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};
use std::time::{Duration, Instant};

use crate::dirs::FixedDirs;
use crate::drive::{SandboxRoot, VirtualDriveBuilder};
use crate::runtime::{BundleDir, ENGINE_BINARY, EngineState, SupervisorEvent};
use crate::EngineSupervisor;

/// Upper bound for anything the tests wait on.
pub const PATIENCE: Duration = Duration::from_secs(20);

/// A temporary host layout: documents folder holding the sandbox, a
/// downloads folder, and a bundle directory holding the engine.
pub struct Sandbox {
    _dir: tempfile::TempDir,
    pub root: SandboxRoot,
    pub bundle: PathBuf,
    pub downloads: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let documents = dir.path().join("Documents");
        let downloads = dir.path().join("Downloads");
        let bundle = dir.path().join("bundle");
        for path in [&documents, &downloads, &bundle] {
            fs_err::create_dir_all(path).unwrap();
        }
        let root = SandboxRoot::new(documents.join("wine")).unwrap();
        Sandbox {
            _dir: dir,
            root,
            bundle,
            downloads,
        }
    }

    pub fn dirs(&self) -> FixedDirs {
        FixedDirs {
            documents: self.root.path().parent().map(PathBuf::from),
            downloads: Some(self.downloads.clone()),
        }
    }

    /// Install a shell script as the engine.  It is left without the
    /// execute bit; the launch has to add it.
    pub fn install_engine(&self, body: &str) -> PathBuf {
        let path = self.bundle.join(ENGINE_BINARY);
        fs_err::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        path
    }

    /// A file inside the temporary directory, outside the sandbox.
    pub fn scratch(&self, name: &str) -> PathBuf {
        self.bundle.join(name)
    }

    pub fn supervisor(&self) -> EngineSupervisor {
        self.supervisor_with(self.dirs())
    }

    pub fn supervisor_with(&self, dirs: FixedDirs) -> EngineSupervisor {
        EngineSupervisor::new(
            self.root.clone(),
            VirtualDriveBuilder::new(Arc::new(dirs)),
            Arc::new(BundleDir::new(&self.bundle)),
        )
    }
}

/// Collect events until one satisfies `last`, which is included.
pub fn events_until(
    rx: &Receiver<SupervisorEvent>,
    last: impl Fn(&EngineState) -> bool,
) -> Vec<SupervisorEvent> {
    let deadline = Instant::now() + PATIENCE;
    let mut events = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let event = rx
            .recv_timeout(remaining)
            .unwrap_or_else(|_| panic!("no final event; got {events:#?}"));
        let done = last(&event.state);
        events.push(event);
        if done {
            return events;
        }
    }
}

/// Read a stream to its end on a helper thread, bounded by [`PATIENCE`].
pub fn read_to_end(mut reader: impl Read + Send + 'static) -> String {
    let (tx, rx) = channel();
    std::thread::spawn(move || {
        let mut text = String::new();
        let res = reader.read_to_string(&mut text).map(|_| text);
        let _ = tx.send(res);
    });
    rx.recv_timeout(PATIENCE)
        .expect("stream never reached end-of-file")
        .unwrap()
}

/// Poll `check` until it holds, bounded by [`PATIENCE`].
pub fn eventually(what: &str, check: impl Fn() -> bool) {
    let deadline = Instant::now() + PATIENCE;
    while !check() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(10));
    }
}
