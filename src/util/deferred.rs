//! A tiny deferred-task queue: schedule a payload to fire after a delay,
//! then drain whatever is due on each tick.
//!
//! Replaces the ad-hoc `setTimeout` bootstraps the source leans on for
//! "wait until the renderer's own session-end handling has settled"
//! races (spec §9) with an explicit, host-driven timer that works the
//! same way against a real clock or a fake one in tests — nothing here
//! spawns a thread or registers with an executor; the caller's own tick
//! (or a unit test) decides when time has "passed" by calling
//! [`DeferredQueue::drain_due`] with `now`.

use web_time::{Duration, Instant};

struct Pending<T> {
    fire_at: Instant,
    payload: T,
}

/// FIFO-ish queue of `(fire_at, payload)` pairs. Firing order on a tie
/// follows scheduling order.
pub struct DeferredQueue<T> {
    pending: Vec<Pending<T>>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self { pending: Vec::new() }
    }
}

impl<T> DeferredQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to become due `delay_ms` after `now`.
    pub fn schedule(&mut self, delay_ms: u64, payload: T, now: Instant) {
        self.pending.push(Pending {
            fire_at: now + Duration::from_millis(delay_ms),
            payload,
        });
    }

    /// Remove and return every payload whose scheduled time has
    /// arrived, in scheduling order.
    pub fn drain_due(&mut self, now: Instant) -> Vec<T> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].fire_at <= now {
                due.push(self.pending.remove(i).payload);
            } else {
                i += 1;
            }
        }
        due
    }

    /// True if nothing is currently pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Discard every pending item without firing it (used when a
    /// session/mode transition invalidates previously scheduled work).
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_is_not_due_before_its_delay_elapses() {
        let mut q = DeferredQueue::new();
        let t0 = Instant::now();
        q.schedule(100, "restore", t0);
        assert!(q.drain_due(t0).is_empty());
    }

    #[test]
    fn item_fires_once_delay_has_elapsed() {
        let mut q = DeferredQueue::new();
        let t0 = Instant::now();
        q.schedule(100, "restore", t0);
        let due = q.drain_due(t0 + Duration::from_millis(150));
        assert_eq!(due, vec!["restore"]);
        assert!(q.is_empty());
    }

    #[test]
    fn items_fire_in_scheduling_order() {
        let mut q = DeferredQueue::new();
        let t0 = Instant::now();
        q.schedule(50, "first", t0);
        q.schedule(50, "second", t0);
        let due = q.drain_due(t0 + Duration::from_millis(100));
        assert_eq!(due, vec!["first", "second"]);
    }

    #[test]
    fn clear_discards_pending_work() {
        let mut q = DeferredQueue::new();
        let t0 = Instant::now();
        q.schedule(10, "x", t0);
        q.clear();
        assert!(q.drain_due(t0 + Duration::from_millis(100)).is_empty());
    }
}
