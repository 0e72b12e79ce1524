// SPDX-License-Identifier: MIT

//! Published supervisor state.

use std::fmt::Display;
use std::sync::mpsc::{Receiver, Sender, channel};

/// Lifecycle state of the engine process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No process, and none has exited since the last stop.
    Idle,
    /// A launch is in progress.
    Launching,
    Running { pid: u32 },
    /// Termination was requested.
    Exiting { pid: u32 },
    /// The process exited on its own.  Idle for the purpose of launching.
    Exited { code: i32 },
}

impl EngineState {
    /// Whether a launch is in progress or a process is live.
    pub fn is_active(&self) -> bool {
        matches!(self, EngineState::Launching | EngineState::Running { .. })
    }

    pub fn pid(&self) -> Option<u32> {
        match self {
            EngineState::Running { pid } | EngineState::Exiting { pid } => Some(*pid),
            _ => None,
        }
    }
}

impl Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Idle => f.write_str("idle"),
            EngineState::Launching => f.write_str("launching"),
            EngineState::Running { pid } => write!(f, "running (pid {pid})"),
            EngineState::Exiting { pid } => write!(f, "exiting (pid {pid})"),
            EngineState::Exited { code } => write!(f, "exited ({code})"),
        }
    }
}

/// A state change or progress message, sent to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorEvent {
    pub state: EngineState,
    /// Human readable, for presentation only.
    pub status: String,
}

/// Fan-out of supervisor events.  Subscribers whose receiver was dropped are
/// pruned on the next publish.
#[derive(Debug, Default)]
pub(crate) struct Publisher {
    subscribers: Vec<Sender<SupervisorEvent>>,
}

impl Publisher {
    pub(crate) fn subscribe(&mut self) -> Receiver<SupervisorEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn publish(&mut self, event: &SupervisorEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}
