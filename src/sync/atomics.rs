//! Atomic counters for pool statistics.
//!
//! Slots keep an `Arc` to the pool's counters so completions signaled from
//! producer threads and timer tasks are counted without touching the pool.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// A monotonically increasing counter.
#[derive(Debug)]
pub struct AtomicCounter(AtomicU64);

impl AtomicCounter {
    /// Create a new counter.
    pub const fn new(initial: u64) -> Self {
        Self(AtomicU64::new(initial))
    }

    /// Increment the counter.
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current value.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new(0)
    }
}

/// An atomic gauge for tracking current values (can go up or down).
#[derive(Debug)]
pub struct AtomicGauge(AtomicUsize);

impl AtomicGauge {
    /// Create a new gauge.
    pub const fn new(initial: usize) -> Self {
        Self(AtomicUsize::new(initial))
    }

    /// Raise the gauge by one, returning the new value.
    pub fn inc(&self) -> usize {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Lower the gauge by one, saturating at zero.
    pub fn dec(&self) -> usize {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = current.saturating_sub(1);
            match self.0.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(c) => current = c,
            }
        }
    }

    /// Raise the gauge by one unless it has reached `limit`.
    ///
    /// Returns false, leaving the gauge unchanged, when it is already at the limit.
    pub fn try_inc_below(&self, limit: usize) -> bool {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            if current >= limit {
                return false;
            }
            match self.0.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(c) => current = c,
            }
        }
    }

    /// Get the current value.
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for AtomicGauge {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Counters shared by a completion pool and every slot it owns.
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    /// Slots allocated because the free list was empty.
    pub slots_allocated: AtomicCounter,
    /// `create()` calls served from the free list.
    pub pool_hits: AtomicCounter,
    /// Terminal transitions to Succeeded.
    pub succeeded: AtomicCounter,
    /// Terminal transitions to Faulted.
    pub faulted: AtomicCounter,
    /// Terminal transitions to Canceled (any cause).
    pub canceled: AtomicCounter,
    /// Cancellations whose cause was a timeout.
    pub timeouts: AtomicCounter,
    /// Completion attempts rejected by the version guard or a prior terminal state.
    pub stale_rejections: AtomicCounter,
    /// Cancellation registrations currently attached to slots.
    pub live_registrations: AtomicGauge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_saturates_at_zero() {
        let gauge = AtomicGauge::new(1);
        assert_eq!(gauge.dec(), 0);
        assert_eq!(gauge.dec(), 0);
        assert_eq!(gauge.inc(), 1);
    }

    #[test]
    fn bounded_inc_stops_at_limit() {
        let gauge = AtomicGauge::new(0);
        assert!(gauge.try_inc_below(2));
        assert!(gauge.try_inc_below(2));
        assert!(!gauge.try_inc_below(2));
        assert_eq!(gauge.get(), 2);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..1000 {
                        if gauge.try_inc_below(3) {
                            gauge.dec();
                        }
                    }
                });
            }
        });
        assert_eq!(gauge.get(), 2);
    }

    #[test]
    fn counter_increments() {
        let counter = AtomicCounter::default();
        counter.increment();
        counter.increment();
        assert_eq!(counter.get(), 2);
    }
}
