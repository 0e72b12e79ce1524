// SPDX-License-Identifier: MIT

//! Deferred, cancelable actions on the owning context's timeline.
//!
//! Nothing here runs on its own: the owner asks for the due actions and
//! applies them itself, so deferred work is ordered with everything else the
//! owner does.

/// Handle of a scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
pub(crate) struct TimerQueue<A> {
    next_id: u64,
    /// Ordered by deadline, then by scheduling order.
    pending: Vec<(f64, TimerId, A)>,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        TimerQueue {
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<A> TimerQueue<A> {
    pub(crate) fn schedule(&mut self, deadline: f64, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        // Equal deadlines keep arrival order.
        let pos = self
            .pending
            .partition_point(|(other, _, _)| *other <= deadline);
        self.pending.insert(pos, (deadline, id, action));
        id
    }

    /// Returns false if the action already ran or was canceled.
    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        match self.pending.iter().position(|(_, other, _)| *other == id) {
            Some(pos) => {
                self.pending.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Remove and return the earliest action due at `now`.
    pub(crate) fn pop_due(&mut self, now: f64) -> Option<(TimerId, A)> {
        match self.pending.first() {
            Some((deadline, _, _)) if *deadline <= now => {
                let (_, id, action) = self.pending.remove(0);
                Some((id, action))
            }
            _ => None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}
