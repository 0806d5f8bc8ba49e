use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

const NEVER: u64 = 0;

/// Lock-free "at most once per interval" gate.
///
/// Stores the last claimed tick as nanoseconds since `epoch`, shifted by one so zero means "never".
/// The stored tick never decreases.
#[derive(Debug)]
pub(crate) struct RefreshGate {
    epoch: Instant,
    interval_nanos: u64,
    last: AtomicU64,
}

impl RefreshGate {
    pub(crate) fn new(epoch: Instant, interval: Duration) -> Self {
        Self {
            epoch,
            interval_nanos: duration_nanos(interval),
            last: AtomicU64::new(NEVER),
        }
    }

    /// Claim the refresh window containing `now`.
    ///
    /// Returns `true` for exactly one caller per window; every other caller gets `false`.
    pub(crate) fn try_claim(&self, now: Instant) -> bool {
        let tick = self.tick(now);
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            if last != NEVER && tick.saturating_sub(last) < self.interval_nanos {
                return false;
            }
            match self
                .last
                .compare_exchange_weak(last, tick, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return true,
                Err(actual) => last = actual,
            }
        }
    }

    /// Record a refresh at `now` without competing for the window.
    ///
    /// Later claims in the window starting at `now` lose.
    pub(crate) fn mark(&self, now: Instant) {
        self.last.fetch_max(self.tick(now), Ordering::AcqRel);
    }

    fn tick(&self, now: Instant) -> u64 {
        duration_nanos(now.saturating_duration_since(self.epoch)).saturating_add(1)
    }
}

fn duration_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
