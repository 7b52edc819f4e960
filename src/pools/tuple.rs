//! Concurrent pool of reference tuples.
//!
//! A reference tuple carries one to three captured values into a
//! continuation without allocating per call. Continuations can run on any
//! thread (timer tasks, producer threads), so unlike the completion pool
//! this one is shared and backed by a lock-free queue.

use std::fmt;
use std::sync::Arc;

use crossbeam_queue::SegQueue;

use crate::sync::atomics::{AtomicCounter, AtomicGauge};

/// Default number of idle tuples kept per pool.
pub const DEFAULT_MAX_RETAINED: usize = 1024;

/// Heap cell recycled between tuples.
struct TupleCell<V> {
    values: Option<V>,
}

/// Thread-safe pool of [`RefTuple`] cells.
///
/// # Example
///
/// ```rust
/// use poolsource::TuplePool;
///
/// let pool = TuplePool::new();
/// let tuple = pool.create((1, "a", true));
/// assert_eq!(tuple.destructure(), (1, "a", true));
/// assert_eq!(pool.idle_count(), 1);
/// ```
pub struct TuplePool<V> {
    idle: SegQueue<Box<TupleCell<V>>>,
    idle_count: AtomicGauge,
    max_retained: usize,
    allocated: AtomicCounter,
    reused: AtomicCounter,
}

impl<V: Send + 'static> TuplePool<V> {
    /// Create a shared pool retaining up to [`DEFAULT_MAX_RETAINED`] idle tuples.
    pub fn new() -> Arc<Self> {
        Self::with_max_retained(DEFAULT_MAX_RETAINED)
    }

    /// Create a shared pool retaining up to `max_retained` idle tuples.
    ///
    /// Tuples returned while the pool is full are freed instead.
    pub fn with_max_retained(max_retained: usize) -> Arc<Self> {
        Arc::new(Self {
            idle: SegQueue::new(),
            idle_count: AtomicGauge::new(0),
            max_retained,
            allocated: AtomicCounter::new(0),
            reused: AtomicCounter::new(0),
        })
    }

    /// Pack `values` into a tuple, reusing an idle cell when one is available.
    pub fn create(self: &Arc<Self>, values: V) -> RefTuple<V> {
        let cell = match self.idle.pop() {
            Some(mut cell) => {
                self.idle_count.dec();
                self.reused.increment();
                cell.values = Some(values);
                cell
            }
            None => {
                self.allocated.increment();
                Box::new(TupleCell {
                    values: Some(values),
                })
            }
        };

        RefTuple {
            cell,
            pool: Arc::clone(self),
        }
    }

    /// Approximate number of idle cells.
    pub fn idle_count(&self) -> usize {
        self.idle_count.get()
    }

    /// Snapshot of pool counters.
    pub fn stats(&self) -> TuplePoolStats {
        TuplePoolStats {
            allocated: self.allocated.get(),
            reused: self.reused.get(),
            idle: self.idle_count.get(),
            max_retained: self.max_retained,
        }
    }

    fn recycle(&self, cell: Box<TupleCell<V>>) {
        // Reserve a place under the cap before the cell becomes visible
        if !self.idle_count.try_inc_below(self.max_retained) {
            return;
        }
        self.idle.push(cell);
    }
}

impl<V> fmt::Debug for TuplePool<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TuplePool")
            .field("idle", &self.idle_count.get())
            .field("max_retained", &self.max_retained)
            .finish()
    }
}

/// Counters for a [`TuplePool`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TuplePoolStats {
    /// Cells allocated because the pool was empty.
    pub allocated: u64,
    /// `create()` calls served from an idle cell.
    pub reused: u64,
    /// Idle cells currently retained.
    pub idle: usize,
    /// Retention cap.
    pub max_retained: usize,
}

/// Pooled bag of captured values, read exactly once.
///
/// [`destructure`](Self::destructure) consumes the tuple, so a second read
/// does not compile:
///
/// ```rust,compile_fail
/// use poolsource::TuplePool;
///
/// let pool = TuplePool::new();
/// let tuple = pool.create((1, "a"));
/// let _ = tuple.destructure();
/// let _ = tuple.destructure();
/// ```
pub struct RefTuple<V: Send + 'static> {
    cell: Box<TupleCell<V>>,
    pool: Arc<TuplePool<V>>,
}

/// One-value reference tuple.
pub type RefTuple1<A> = RefTuple<(A,)>;
/// Two-value reference tuple.
pub type RefTuple2<A, B> = RefTuple<(A, B)>;
/// Three-value reference tuple.
pub type RefTuple3<A, B, C> = RefTuple<(A, B, C)>;

impl<V: Send + 'static> RefTuple<V> {
    /// Read the values and return the cell to its pool.
    pub fn destructure(self) -> V {
        let RefTuple { mut cell, pool } = self;
        let values = match cell.values.take() {
            Some(values) => values,
            None => ps_violation!(PS901, "reference tuple cell was recycled while still owned"),
        };
        pool.recycle(cell);
        values
    }
}

impl<V: Send + 'static> fmt::Debug for RefTuple<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefTuple").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_and_reuse() {
        let pool = TuplePool::new();
        let first = pool.create((1, "a", true));
        assert_eq!(first.destructure(), (1, "a", true));

        let second = pool.create((2, "b", false));
        assert_eq!(second.destructure(), (2, "b", false));

        let stats = pool.stats();
        assert_eq!(stats.allocated, 1);
        assert_eq!(stats.reused, 1);
        assert_eq!(stats.idle, 1);
    }

    #[test]
    fn destructure_releases_values() {
        let pool: Arc<TuplePool<(Arc<String>,)>> = TuplePool::new();
        let shared = Arc::new("captured".to_string());

        let tuple = pool.create((Arc::clone(&shared),));
        assert_eq!(Arc::strong_count(&shared), 2);
        let (value,) = tuple.destructure();
        drop(value);
        assert_eq!(Arc::strong_count(&shared), 1);
    }

    #[test]
    fn retention_cap() {
        let pool = TuplePool::with_max_retained(1);
        let a = pool.create((1u8,));
        let b = pool.create((2u8,));
        a.destructure();
        b.destructure();
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn retention_cap_holds_under_contention() {
        let pool: Arc<TuplePool<(usize,)>> = TuplePool::with_max_retained(2);
        let barrier = std::sync::Barrier::new(8);

        std::thread::scope(|scope| {
            for t in 0..8 {
                let pool = Arc::clone(&pool);
                let barrier = &barrier;
                scope.spawn(move || {
                    let held: Vec<_> = (0..16).map(|i| pool.create((t * 16 + i,))).collect();
                    barrier.wait();
                    for tuple in held {
                        tuple.destructure();
                    }
                });
            }
        });

        assert_eq!(pool.idle_count(), 2);
        assert_eq!(pool.idle.len(), 2);
    }

    #[test]
    fn concurrent_create_destructure() {
        let pool: Arc<TuplePool<(usize, usize)>> = TuplePool::new();

        std::thread::scope(|scope| {
            for t in 0..4 {
                let pool = Arc::clone(&pool);
                scope.spawn(move || {
                    for i in 0..1000 {
                        let tuple = pool.create((t, i));
                        assert_eq!(tuple.destructure(), (t, i));
                    }
                });
            }
        });

        let stats = pool.stats();
        assert_eq!(stats.allocated + stats.reused, 4000);
        assert!(stats.allocated <= 4);
    }
}
