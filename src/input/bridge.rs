// SPDX-License-Identifier: MIT

//! Turns presentation-layer gestures into pointer events.

use std::time::Duration;

use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::geometry::{
    InputError, NormalizedPointerEvent, PointerEvent, SurfacePoint, SurfaceSize, buttons,
};
use super::sink::EventSink;
use super::timer::{TimerId, TimerQueue};

/// How long a tap holds the primary button down.
pub const DEFAULT_TAP_RELEASE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
enum Deferred {
    Release,
}

/// Bridges pointer gestures on the rendering surface to an [`EventSink`].
///
/// Keeps the last delivered event so a button change can be reported at the
/// last known position.  Before the first move that position is all zeros.
///
/// The bridge never spawns threads.  A tap's release is queued and fires from
/// [`InputBridge::run_due_timers`], which the owner calls from the same
/// context that feeds it gestures.
#[derive(Debug)]
pub struct InputBridge<S, C = SystemClock> {
    sink: S,
    clock: C,
    tap_release: Duration,
    surface: Option<SurfaceSize>,
    last: NormalizedPointerEvent,
    pressed: bool,
    timers: TimerQueue<Deferred>,
}

impl<S: EventSink> InputBridge<S, SystemClock> {
    pub fn new(sink: S) -> Self {
        InputBridge::with_clock(sink, SystemClock::new())
    }
}

impl<S: EventSink, C: Clock> InputBridge<S, C> {
    pub fn with_clock(sink: S, clock: C) -> Self {
        InputBridge {
            sink,
            clock,
            tap_release: DEFAULT_TAP_RELEASE,
            surface: None,
            last: NormalizedPointerEvent::default(),
            pressed: false,
            timers: TimerQueue::default(),
        }
    }

    pub fn with_tap_release(mut self, delay: Duration) -> Self {
        self.tap_release = delay;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Surface size of the most recent accepted move.
    pub fn surface_size(&self) -> Option<SurfaceSize> {
        self.surface
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn last_event(&self) -> NormalizedPointerEvent {
        self.last
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    fn mask(&self) -> u8 {
        if self.pressed {
            buttons::PRIMARY
        } else {
            buttons::NONE
        }
    }

    fn emit(&mut self, event: NormalizedPointerEvent) -> NormalizedPointerEvent {
        self.last = event;
        self.sink.deliver(&event);
        event
    }

    /// Report the pointer at `point`, carrying the current button state.
    ///
    /// A rejected size leaves the bridge untouched and delivers nothing.
    pub fn on_pointer_move(
        &mut self,
        point: SurfacePoint,
        size: SurfaceSize,
    ) -> Result<NormalizedPointerEvent, InputError> {
        let raw = PointerEvent {
            surface_x: point.x,
            surface_y: point.y,
            button_mask: self.mask(),
            timestamp_seconds: self.clock.now(),
        };
        let event = NormalizedPointerEvent::from_pointer(&raw, size)?;
        self.surface = Some(size);
        Ok(self.emit(event))
    }

    /// Report a primary button change at the last known position.
    pub fn on_press_changed(&mut self, pressed: bool) -> NormalizedPointerEvent {
        self.pressed = pressed;
        let event = self.last.with_buttons(self.mask(), self.clock.now());
        self.emit(event)
    }

    /// A tap: move to `point`, press, and queue the release.
    ///
    /// Returns the handle of the queued release, which can be canceled.
    pub fn on_tap(
        &mut self,
        point: SurfacePoint,
        size: SurfaceSize,
    ) -> Result<TimerId, InputError> {
        self.on_pointer_move(point, size)?;
        self.on_press_changed(true);
        let deadline = self.clock.monotonic() + self.tap_release.as_secs_f64();
        let id = self.timers.schedule(deadline, Deferred::Release);
        debug!("Tap at ({}, {}), release queued as {id:?}", point.x, point.y);
        Ok(id)
    }

    /// A drag sample: move to `point` with the button held.
    pub fn on_drag_changed(
        &mut self,
        point: SurfacePoint,
        size: SurfaceSize,
    ) -> Result<NormalizedPointerEvent, InputError> {
        self.on_pointer_move(point, size)?;
        Ok(self.on_press_changed(true))
    }

    /// The end of a drag releases the button where the pointer is.
    pub fn on_drag_ended(&mut self) -> NormalizedPointerEvent {
        self.on_press_changed(false)
    }

    /// Drop a queued action.  Returns false if it already ran.
    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    /// Run every queued action whose time has come, oldest first.
    /// Returns how many ran.
    pub fn run_due_timers(&mut self) -> usize {
        let now = self.clock.monotonic();
        let mut ran = 0;
        while let Some((id, action)) = self.timers.pop_due(now) {
            match action {
                Deferred::Release => {
                    debug!("Releasing tap {id:?}");
                    self.on_press_changed(false);
                }
            }
            ran += 1;
        }
        ran
    }
}
