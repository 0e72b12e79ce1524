// SPDX-License-Identifier: MIT

//! Bootstraps the Windows-shaped drive tree that the engine runs against.
//!
//! The tree lives below a private [`SandboxRoot`].  It holds an emulated
//! system drive (`drive_c`), a device map whose `d:` entry links to the host
//! downloads folder, and a static `system.reg`.  The layout is created once;
//! when the primary system subtree already exists, bootstrap does nothing.

mod builder;
mod desktop;
pub mod error;
pub mod layout;
mod link;
mod registry;

pub use builder::{BootstrapStep, LayoutStatus, VirtualDriveBuilder};
pub use desktop::{DesktopEntry, desktop_entries};
pub use error::BootstrapError;
pub use layout::{REQUIRED_DIRECTORIES, SandboxRoot};
pub use registry::SYSTEM_REG_CONTENT;
