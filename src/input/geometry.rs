// SPDX-License-Identifier: MIT

//! Surface-local pointer samples and their normalized form.

/// Button mask values.
pub mod buttons {
    pub const NONE: u8 = 0;
    pub const PRIMARY: u8 = 1;
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("Invalid surface size {width}x{height}")]
    InvalidSurfaceSize { width: f64, height: f64 },
}

/// A point in surface coordinates: origin top-left, Y down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfacePoint {
    pub x: f64,
    pub y: f64,
}

impl SurfacePoint {
    pub fn new(x: f64, y: f64) -> Self {
        SurfacePoint { x, y }
    }
}

/// Current pixel dimensions of the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub fn new(width: f64, height: f64) -> Self {
        SurfaceSize { width, height }
    }

    /// Reject sizes that can't be divided by.
    pub fn validate(self) -> Result<Self, InputError> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if usable(self.width) && usable(self.height) {
            Ok(self)
        } else {
            Err(InputError::InvalidSurfaceSize {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// One raw pointer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub surface_x: f64,
    pub surface_y: f64,
    pub button_mask: u8,
    pub timestamp_seconds: f64,
}

/// A pointer sample in normalized device coordinates and bottom-left pixel
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedPointerEvent {
    /// -1 at the left edge, 1 at the right edge.
    pub ndc_x: f64,
    /// 1 at the top edge, -1 at the bottom edge.
    pub ndc_y: f64,
    pub pixel_x: f64,
    /// Distance from the bottom edge.
    pub pixel_y: f64,
    pub button_mask: u8,
    pub timestamp_seconds: f64,
}

impl NormalizedPointerEvent {
    pub fn from_pointer(event: &PointerEvent, size: SurfaceSize) -> Result<Self, InputError> {
        let size = size.validate()?;
        Ok(NormalizedPointerEvent {
            ndc_x: 2.0 * (event.surface_x / size.width) - 1.0,
            ndc_y: 1.0 - 2.0 * (event.surface_y / size.height),
            pixel_x: event.surface_x,
            pixel_y: size.height - event.surface_y,
            button_mask: event.button_mask,
            timestamp_seconds: event.timestamp_seconds,
        })
    }

    /// The same position with a different button mask and time.
    pub fn with_buttons(self, button_mask: u8, timestamp_seconds: f64) -> Self {
        NormalizedPointerEvent {
            button_mask,
            timestamp_seconds,
            ..self
        }
    }
}
