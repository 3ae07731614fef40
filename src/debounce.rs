//! Trigger debouncing
//!
//! A leaky bucket of one: the first event of a burst is accepted and every
//! event within `COOLDOWN` of that accepted event is dropped. The window is
//! measured from the accepted event, never from the latest one.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

/// Cooldown between two accepted triggers
pub const COOLDOWN: Duration = Duration::from_secs(1);

/// Lock-free debouncer, safe to share between notification callbacks.
#[derive(Debug)]
pub struct Debouncer {
    origin: Instant,
    window: i64,
    /// Nanoseconds since `origin` of the last accepted trigger.
    last_accepted: AtomicI64,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::with_window(COOLDOWN)
    }

    /// Debouncer with a window other than [`COOLDOWN`], for tests that
    /// cannot wait a full second.
    pub(crate) fn with_window(window: Duration) -> Self {
        let window = i64::try_from(window.as_nanos()).unwrap_or(i64::MAX);
        Self {
            origin: Instant::now(),
            window,
            // One full window before construction, so the first event passes.
            last_accepted: AtomicI64::new(-window),
        }
    }

    /// Accept or suppress an event observed at `now`.
    pub fn should_trigger(&self, now: Instant) -> bool {
        let at = i64::try_from(now.saturating_duration_since(self.origin).as_nanos())
            .unwrap_or(i64::MAX);

        let mut last = self.last_accepted.load(Ordering::Acquire);
        loop {
            if at.saturating_sub(last) < self.window {
                return false;
            }
            match self.last_accepted.compare_exchange_weak(
                last,
                at,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(current) => last = current,
            }
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}
