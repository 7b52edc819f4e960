//! Pool statistics.

/// Snapshot of a completion pool's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Slots ever allocated by the pool.
    pub capacity: usize,

    /// Slots currently idle in the free list.
    pub idle: usize,

    /// Slots currently checked out.
    pub in_flight: usize,

    /// `create()` calls that had to allocate a slot.
    pub slots_allocated: u64,

    /// `create()` calls served from the free list.
    pub pool_hits: u64,

    /// Cycles that ended with a value.
    pub succeeded: u64,

    /// Cycles that ended with a fault.
    pub faulted: u64,

    /// Cycles that ended canceled, any cause.
    pub canceled: u64,

    /// Cancellations caused by a timeout.
    pub timeouts: u64,

    /// Completion attempts ignored because the handle was stale or the
    /// cycle had already finished.
    pub stale_rejections: u64,

    /// Timeout and external watchers currently attached.
    pub live_registrations: usize,
}

impl PoolStats {
    /// Total terminal transitions.
    pub fn completed(&self) -> u64 {
        self.succeeded + self.faulted + self.canceled
    }

    /// Fraction of `create()` calls served without allocating.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.pool_hits + self.slots_allocated;
        if total == 0 {
            return 0.0;
        }
        self.pool_hits as f64 / total as f64
    }
}

impl std::fmt::Display for PoolStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Completion Pool Statistics:")?;
        writeln!(f, "  Slots:          {} ({} idle, {} in flight)", self.capacity, self.idle, self.in_flight)?;
        writeln!(f, "  Pool hit ratio: {:.1}%", self.hit_ratio() * 100.0)?;
        writeln!(f, "  Succeeded:      {}", self.succeeded)?;
        writeln!(f, "  Faulted:        {}", self.faulted)?;
        writeln!(f, "  Canceled:       {} ({} timeouts)", self.canceled, self.timeouts)?;
        writeln!(f, "  Stale attempts: {}", self.stale_rejections)?;
        write!(f, "  Watchers:       {}", self.live_registrations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_metrics() {
        let stats = PoolStats {
            slots_allocated: 1,
            pool_hits: 3,
            succeeded: 2,
            canceled: 1,
            ..PoolStats::default()
        };
        assert_eq!(stats.completed(), 3);
        assert!((stats.hit_ratio() - 0.75).abs() < f64::EPSILON);
        assert!(stats.to_string().contains("75.0%"));
        assert_eq!(PoolStats::default().hit_ratio(), 0.0);
    }
}
