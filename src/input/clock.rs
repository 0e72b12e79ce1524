// SPDX-License-Identifier: MIT

//! Time sources for event timestamps and deferred actions.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Seconds on the owning context's timeline.
pub trait Clock {
    /// Time stamped on events.
    fn now(&self) -> f64;

    /// Time deadlines are measured in.  Never goes backwards.
    fn monotonic(&self) -> f64 {
        self.now()
    }
}

/// Wall-clock seconds since the UNIX epoch for timestamps, and seconds since
/// creation on the monotonic clock for deadlines.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or(0.0)
    }

    fn monotonic(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// A clock that only moves when told to.  Clones share the same time, so a
/// presentation layer can keep one handle and drive it from its frame clock.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn starting_at(seconds: f64) -> Self {
        let clock = ManualClock::default();
        clock.set(seconds);
        clock
    }

    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.set(self.now() + by.as_secs_f64());
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}
