// SPDX-License-Identifier: MIT

//! Supervises the compatibility engine process.
//!
//! [`EngineSupervisor`] is the entry point.  A launch locates the engine
//! binary through a [`ResourceLocator`], marks it executable through a
//! [`PermissionFacility`], makes sure the sandbox layout exists, and spawns
//! the engine with an [`EnvironmentConfig`] that points it at the sandbox.
//! A relay thread drains the engine's output into the log, a watcher thread
//! reports the process exit back to the supervisor, and every state change is
//! published to subscribers in order.

mod env;
pub mod error;
mod output;
mod permission;
mod resource;
mod spawn;
mod state;
mod supervisor;

pub use env::{ENGINE_FLAGS, EnvironmentConfig, PREFIX_VAR};
pub use error::LaunchError;
pub use output::OutputReader;
pub use permission::{Chmod, PermissionFacility};
pub use resource::{BundleDir, ENGINE_BINARY, ResourceLocator, SearchPath};
pub use spawn::LaunchEnv;
pub use state::{EngineState, SupervisorEvent};
pub use supervisor::EngineSupervisor;
