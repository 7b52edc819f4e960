//! Synchronization primitives.
//!
//! Thin wrappers over std or parking_lot mutexes, plus the atomic
//! counters shared between a pool and the slots it hands out.

pub(crate) mod atomics;
pub(crate) mod mutex;
