//! The pooled completion source.

#[cfg(feature = "tokio")]
use std::cell::Cell;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use crate::api::awaitable::Awaitable;
use crate::api::config::PoolConfig;
use crate::api::error::{CancelCause, CompletionStatus, Fault, SourceError};
use crate::api::handle::{Completer, Handle};
use crate::api::stats::PoolStats;
use crate::core::slot::{Outcome, Slot};
use crate::pools::active_list::ActiveList;
use crate::pools::free_list::FreeList;
use crate::sync::atomics::PoolCounters;

/// Arena of reusable completion sources.
///
/// Each slot is a small state machine (Pending → Succeeded | Faulted |
/// Canceled) that is recycled after its result is consumed. Handles carry
/// the slot version they were created with, so a late completion from a
/// timer, a cancellation watcher or a slow producer is rejected with a
/// single comparison once the slot has moved on.
///
/// The pool itself is owned by one logical sequence and is `!Sync`: the
/// free list and in-flight list are not synchronized. Completion may still
/// be signaled from any thread through a [`Completer`].
///
/// # Example
///
/// ```rust
/// use poolsource::{CompletionPool, CompletionStatus};
///
/// let pool = CompletionPool::<u32>::new();
/// let handle = pool.create();
///
/// assert!(pool.try_set_result(handle, 42));
/// assert_eq!(pool.status(handle), CompletionStatus::Succeeded);
/// assert_eq!(pool.consume(handle).unwrap(), 42);
///
/// // The slot is back in the pool and the old handle is stale.
/// assert!(!pool.try_set_result(handle, 7));
/// ```
pub struct CompletionPool<T: Send + 'static> {
    slots: RefCell<Vec<Arc<Slot<T>>>>,
    free: RefCell<FreeList>,
    in_flight: RefCell<ActiveList>,
    counters: Arc<PoolCounters>,
    config: PoolConfig,
    /// Set once a default timeout has been skipped for lack of a runtime.
    #[cfg(feature = "tokio")]
    pub(crate) default_timeout_skipped: Cell<bool>,
}

impl<T: Send + 'static> CompletionPool<T> {
    /// Create a pool with the default configuration.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create a pool, pre-allocating `config.initial_capacity` slots.
    pub fn with_config(config: PoolConfig) -> Self {
        let pool = Self {
            slots: RefCell::new(Vec::with_capacity(config.initial_capacity)),
            free: RefCell::new(FreeList::new()),
            in_flight: RefCell::new(ActiveList::new()),
            counters: Arc::new(PoolCounters::default()),
            config,
            #[cfg(feature = "tokio")]
            default_timeout_skipped: Cell::new(false),
        };

        for _ in 0..pool.config.initial_capacity {
            let index = pool.allocate_slot();
            pool.free.borrow_mut().push(index);
        }
        pool
    }

    /// The configuration this pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Check out a slot and start a new cycle.
    ///
    /// Reuses an idle slot when one is available. If the pool was configured
    /// with a default timeout it is armed here.
    pub fn create(&self) -> Handle<T> {
        let popped = self.free.borrow_mut().try_pop();
        let index = match popped {
            Some(index) => {
                self.counters.pool_hits.increment();
                index
            }
            None => self.allocate_slot(),
        };
        debug_assert!(!self.free.borrow().is_pooled(index));
        self.in_flight.borrow_mut().insert(index);

        let version = self.slots.borrow()[index as usize].version();
        let handle = Handle::new(index, version);
        ps_trace!("create slot {} version {}", index, version);

        #[cfg(feature = "tokio")]
        {
            if let Some(timeout) = self.config.default_timeout {
                self.arm_default_timeout(handle, timeout);
            }
        }

        handle
    }

    fn allocate_slot(&self) -> u32 {
        let index = self.free.borrow_mut().grow();
        let slot = Arc::new(Slot::new(index, Arc::clone(&self.counters)));
        self.slots.borrow_mut().push(slot);
        self.counters.slots_allocated.increment();
        index
    }

    /// Resolve a handle to its slot, whatever version it carries.
    pub(crate) fn slot(&self, handle: Handle<T>) -> Arc<Slot<T>> {
        match self.slots.borrow().get(handle.index as usize) {
            Some(slot) => Arc::clone(slot),
            None => ps_violation!(PS007, "{:?}", handle),
        }
    }

    /// Complete the cycle with a value. Returns false if the handle is stale
    /// or the cycle already finished.
    pub fn try_set_result(&self, handle: Handle<T>, value: T) -> bool {
        self.slot(handle)
            .try_complete(handle.version, Outcome::Succeeded(value))
    }

    /// Cancel the cycle. Returns false if the handle is stale or the cycle
    /// already finished.
    pub fn try_set_canceled(&self, handle: Handle<T>, cause: CancelCause) -> bool {
        self.slot(handle)
            .try_complete(handle.version, Outcome::Canceled(cause))
    }

    /// Fault the cycle. Returns false if the handle is stale or the cycle
    /// already finished.
    pub fn try_set_fault(&self, handle: Handle<T>, fault: impl Into<Fault>) -> bool {
        self.slot(handle)
            .try_complete(handle.version, Outcome::Faulted(fault.into()))
    }

    /// Current state of the handle's slot.
    ///
    /// This does not validate the version: a stale handle reports whatever
    /// cycle the slot is in now.
    pub fn status(&self, handle: Handle<T>) -> CompletionStatus {
        self.slot(handle).status()
    }

    /// True while the handle refers to the slot's current cycle.
    pub fn is_live(&self, handle: Handle<T>) -> bool {
        !handle.is_dangling() && self.slot(handle).is_live(handle.version)
    }

    /// Register the one continuation of this cycle.
    ///
    /// `callback(state)` runs exactly once, on whichever thread performs the
    /// terminal transition, or immediately if the cycle already finished.
    ///
    /// # Panics
    ///
    /// Panics if a continuation (or an awaiting task) is already registered
    /// for this cycle, or if the handle is stale.
    pub fn register_continuation<S, F>(&self, handle: Handle<T>, callback: F, state: S)
    where
        S: Send + 'static,
        F: FnOnce(S) + Send + 'static,
    {
        self.slot(handle)
            .subscribe(handle.version, Box::new(move || callback(state)));
    }

    /// Read the terminal outcome and return the slot to the pool.
    ///
    /// # Panics
    ///
    /// Panics if the cycle is still pending or the handle is stale.
    pub fn consume(&self, handle: Handle<T>) -> Result<T, SourceError> {
        let result = self.slot(handle).take_terminal(handle.version);
        self.release(handle.index);
        ps_trace!("consumed slot {} version {}", handle.index, handle.version);
        result
    }

    fn release(&self, index: u32) {
        if !self.in_flight.borrow_mut().remove(index) {
            ps_violation!(PS901, "slot {} was not in flight", index);
        }
        self.free.borrow_mut().push(index);
    }

    /// A thread-safe producer for this cycle.
    pub fn completer(&self, handle: Handle<T>) -> Completer<T> {
        Completer::new(Arc::downgrade(&self.slot(handle)), handle.version)
    }

    /// A future that resolves with this cycle's outcome and recycles the slot.
    pub fn awaitable(&self, handle: Handle<T>) -> Awaitable<'_, T> {
        Awaitable::new(self, handle)
    }

    /// Force-dispose a cycle: cancel it with [`CancelCause::Disposed`] if it
    /// is still pending, discard its outcome and return the slot.
    ///
    /// Returns false, doing nothing, if the handle is already stale.
    pub fn dispose(&self, handle: Handle<T>) -> bool {
        if !self.is_live(handle) {
            return false;
        }

        let slot = self.slot(handle);
        if slot.try_complete(handle.version, Outcome::Canceled(CancelCause::Disposed)) {
            ps_emit!(PS102);
        }
        let _ = slot.take_terminal(handle.version);
        self.release(handle.index);
        true
    }

    /// Cancel every in-flight cycle that is still pending.
    ///
    /// Cycles stay checked out until their owners consume them. Returns the
    /// number of cycles this call canceled.
    pub fn cancel_in_flight(&self, cause: CancelCause) -> usize {
        let indices = self.in_flight.borrow().indices();
        let mut canceled = 0;
        for index in indices {
            let slot = Arc::clone(&self.slots.borrow()[index as usize]);
            if slot.try_complete(slot.version(), Outcome::Canceled(cause.clone())) {
                canceled += 1;
            }
        }
        if canceled > 0 {
            ps_debug!("canceled {} in-flight sources: {}", canceled, cause);
        }
        canceled
    }

    /// Slots currently idle.
    pub fn idle_count(&self) -> usize {
        self.free.borrow().len()
    }

    /// Slots currently checked out.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.borrow().len()
    }

    /// Slots ever allocated.
    pub fn capacity(&self) -> usize {
        self.free.borrow().capacity()
    }

    /// Snapshot of pool statistics.
    pub fn stats(&self) -> PoolStats {
        let c = &self.counters;
        PoolStats {
            capacity: self.capacity(),
            idle: self.idle_count(),
            in_flight: self.in_flight_count(),
            slots_allocated: c.slots_allocated.get(),
            pool_hits: c.pool_hits.get(),
            succeeded: c.succeeded.get(),
            faulted: c.faulted.get(),
            canceled: c.canceled.get(),
            timeouts: c.timeouts.get(),
            stale_rejections: c.stale_rejections.get(),
            live_registrations: c.live_registrations.get(),
        }
    }
}

impl<T: Send + 'static> Default for CompletionPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Drop for CompletionPool<T> {
    fn drop(&mut self) {
        self.cancel_in_flight(CancelCause::Disposed);
    }
}

impl<T: Send + 'static> fmt::Debug for CompletionPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionPool")
            .field("capacity", &self.capacity())
            .field("idle", &self.idle_count())
            .field("in_flight", &self.in_flight_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn prewarmed_slots_are_reused() {
        let pool = CompletionPool::<u8>::with_config(PoolConfig::minimal().with_initial_capacity(2));
        assert_eq!(pool.idle_count(), 2);

        let h = pool.create();
        assert_eq!(pool.idle_count(), 1);
        assert_eq!(pool.in_flight_count(), 1);

        pool.try_set_result(h, 1);
        pool.consume(h).unwrap();

        let stats = pool.stats();
        assert_eq!(stats.slots_allocated, 2);
        assert_eq!(stats.pool_hits, 1);
        assert_eq!(stats.idle, 2);
        assert_eq!(stats.in_flight, 0);
    }

    #[test]
    fn consumed_slot_is_popped_with_fresh_version() {
        let pool = CompletionPool::<u8>::with_config(PoolConfig::minimal());
        let first = pool.create();
        pool.try_set_canceled(first, CancelCause::requested("nope"));
        assert!(pool.consume(first).is_err());

        let second = pool.create();
        assert_eq!(second.raw_index(), first.raw_index());
        assert!(second.raw_version() > first.raw_version());
        assert_eq!(pool.status(second), CompletionStatus::Pending);
        assert!(!pool.is_live(first));
        assert!(pool.is_live(second));
    }

    #[test]
    fn dispose_pending_cycle() {
        let pool = CompletionPool::<u8>::new();
        let h = pool.create();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        pool.register_continuation(h, move |c: Arc<AtomicUsize>| {
            c.fetch_add(1, Ordering::SeqCst);
        }, counter);

        assert!(pool.dispose(h));
        assert!(!pool.dispose(h));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(pool.in_flight_count(), 0);
        assert_eq!(pool.stats().canceled, 1);
    }

    #[test]
    fn cancel_in_flight_cancels_pending_only() {
        let pool = CompletionPool::<u8>::new();
        let a = pool.create();
        let b = pool.create();
        let c = pool.create();
        pool.try_set_result(b, 2);

        assert_eq!(pool.cancel_in_flight(CancelCause::requested("shutdown")), 2);
        assert_eq!(pool.status(a), CompletionStatus::Canceled);
        assert_eq!(pool.consume(b).unwrap(), 2);
        let err = pool.consume(c).unwrap_err();
        assert_eq!(err.cancel_cause(), Some(&CancelCause::requested("shutdown")));
        assert!(pool.consume(a).is_err());
    }

    #[test]
    fn dropping_pool_cancels_outstanding_work() {
        let pool = CompletionPool::<u8>::new();
        let completer = pool.completer(pool.create());
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let h = pool.create();
        pool.register_continuation(h, move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
        }, ());

        drop(pool);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(completer.is_stale());
        assert!(!completer.try_set_result(1));
    }

    #[test]
    #[should_panic(expected = "PS007")]
    fn dangling_handle_panics() {
        let pool = CompletionPool::<u8>::new();
        pool.status(Handle::dangling());
    }
}
