//! # winkor-sandbox
//!
//! Runs a Windows compatibility engine inside a Windows-shaped sandbox.
//!
//! - [`drive`] materializes the sandbox: the emulated system drive, the
//!   removable drive link, and the static registry file.
//! - [`runtime`] supervises the engine process and publishes its state.
//! - [`input`] turns pointer gestures into events for the engine.
//! - [`config`] loads the launcher settings.

#[cfg(not(unix))]
compile_error!("winkor-sandbox supports unix hosts only");

pub mod config;
pub mod dirs;
pub mod drive;
pub mod input;
pub mod runtime;


pub use drive::{SandboxRoot, VirtualDriveBuilder};
pub use input::{InputBridge, NormalizedPointerEvent};
pub use runtime::{EngineState, EngineSupervisor, LaunchError, SupervisorEvent};
