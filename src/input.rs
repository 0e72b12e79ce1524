// SPDX-License-Identifier: MIT

//! Pointer input for the engine's rendering surface.
//!
//! Surface coordinates put the origin at the top-left with Y growing down.
//! Events leave the bridge in two forms at once: normalized device
//! coordinates, where the surface spans -1 to 1 on both axes with Y up, and
//! pixel coordinates measured from the bottom-left corner.

mod bridge;
mod clock;
mod geometry;
mod sink;
mod timer;

pub use bridge::{DEFAULT_TAP_RELEASE, InputBridge};
pub use clock::{Clock, ManualClock, SystemClock};
pub use geometry::{
    InputError, NormalizedPointerEvent, PointerEvent, SurfacePoint, SurfaceSize, buttons,
};
pub use sink::{ChannelSink, EventSink, TracingSink};
pub use timer::TimerId;
