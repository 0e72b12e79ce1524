// SPDX-License-Identifier: MIT

//! Destinations for bridged pointer events.

use std::sync::mpsc::{Receiver, Sender, channel};

use tracing::trace;

use super::geometry::NormalizedPointerEvent;

/// Receives every event the bridge emits.
///
/// This is the hand-off point to whatever carries input to the engine.
pub trait EventSink {
    fn deliver(&mut self, event: &NormalizedPointerEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&NormalizedPointerEvent),
{
    fn deliver(&mut self, event: &NormalizedPointerEvent) {
        self(event)
    }
}

/// Forwards events into an in-process channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<NormalizedPointerEvent>,
}

impl ChannelSink {
    pub fn channel() -> (ChannelSink, Receiver<NormalizedPointerEvent>) {
        let (tx, rx) = channel();
        (ChannelSink { tx }, rx)
    }
}

impl From<Sender<NormalizedPointerEvent>> for ChannelSink {
    fn from(tx: Sender<NormalizedPointerEvent>) -> Self {
        ChannelSink { tx }
    }
}

impl EventSink for ChannelSink {
    fn deliver(&mut self, event: &NormalizedPointerEvent) {
        if self.tx.send(*event).is_err() {
            trace!("Pointer event dropped, nobody is receiving");
        }
    }
}

/// Logs every event and delivers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn deliver(&mut self, event: &NormalizedPointerEvent) {
        trace!(
            x = event.pixel_x,
            y = event.pixel_y,
            ndc_x = event.ndc_x,
            ndc_y = event.ndc_y,
            button = event.button_mask,
            "Pointer event"
        );
    }
}
