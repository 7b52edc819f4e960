//! Version-stamped handles and the cross-thread producer side.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Weak;

use crate::api::error::{CancelCause, CompletionStatus, Fault};
use crate::core::slot::{Generation, Outcome, Slot};

/// A handle to one create→consume cycle of a pooled completion source.
///
/// Handles are plain `(index, version)` pairs. Once the cycle is consumed
/// the slot's version moves on and every copy of the handle goes stale:
/// completion attempts through it return `false`, and consuming or
/// subscribing through it panics.
pub struct Handle<T> {
    pub(crate) index: u32,
    pub(crate) version: Generation,
    _marker: PhantomData<fn() -> T>,
}

// Manual implementations to avoid T: Copy/Clone bounds
impl<T> Copy for Handle<T> {}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.version == other.version
    }
}

impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.version.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("index", &self.index)
            .field("version", &self.version)
            .finish()
    }
}

impl<T> Handle<T> {
    pub(crate) const fn new(index: u32, version: Generation) -> Self {
        Self {
            index,
            version,
            _marker: PhantomData,
        }
    }

    /// Create a dangling handle (for default initialization).
    pub const fn dangling() -> Self {
        Self::new(u32::MAX, 0)
    }

    /// Check if this is a dangling handle.
    pub fn is_dangling(&self) -> bool {
        self.index == u32::MAX
    }

    /// Get the raw slot index (for debugging).
    pub fn raw_index(&self) -> u32 {
        self.index
    }

    /// Get the version stamped at creation (for debugging).
    pub fn raw_version(&self) -> u32 {
        self.version
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::dangling()
    }
}

/// Producer side of one cycle, usable from any thread.
///
/// Holds a weak reference to the slot: a completer never keeps a pool's
/// slot alive, and once the pool is gone every attempt returns `false`.
pub struct Completer<T> {
    slot: Weak<Slot<T>>,
    version: Generation,
}

impl<T> Clone for Completer<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Weak::clone(&self.slot),
            version: self.version,
        }
    }
}

impl<T> fmt::Debug for Completer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("version", &self.version)
            .field("stale", &self.is_stale())
            .finish()
    }
}

impl<T> Completer<T> {
    pub(crate) fn new(slot: Weak<Slot<T>>, version: Generation) -> Self {
        Self { slot, version }
    }

    /// Complete the cycle with a value.
    pub fn try_set_result(&self, value: T) -> bool {
        self.complete(Outcome::Succeeded(value))
    }

    /// Cancel the cycle.
    pub fn try_set_canceled(&self, cause: CancelCause) -> bool {
        self.complete(Outcome::Canceled(cause))
    }

    /// Fault the cycle with an error.
    pub fn try_set_fault(&self, fault: impl Into<Fault>) -> bool {
        self.complete(Outcome::Faulted(fault.into()))
    }

    /// State of the slot this completer points at, whichever cycle it is in.
    ///
    /// Returns `None` once the pool has been dropped.
    pub fn status(&self) -> Option<CompletionStatus> {
        self.slot.upgrade().map(|slot| slot.status())
    }

    /// True once the cycle has been consumed or the pool dropped.
    pub fn is_stale(&self) -> bool {
        self.slot
            .upgrade()
            .map_or(true, |slot| !slot.is_live(self.version))
    }

    fn complete(&self, outcome: Outcome<T>) -> bool {
        match self.slot.upgrade() {
            Some(slot) => slot.try_complete(self.version, outcome),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_dangling_handle() {
        let handle: Handle<u64> = Handle::default();
        assert!(handle.is_dangling());
        assert_eq!(handle.raw_version(), 0);
    }

    #[test]
    fn handles_compare_by_index_and_version() {
        let a: Handle<String> = Handle::new(3, 1);
        let b: Handle<String> = Handle::new(3, 2);
        assert_ne!(a, b);

        let set: HashSet<_> = [a, a, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn orphaned_completer_is_stale() {
        let completer: Completer<u8> = Completer::new(Weak::new(), 1);
        assert!(completer.is_stale());
        assert!(!completer.try_set_result(1));
        assert_eq!(completer.status(), None);
    }
}
