//! Public API for poolsource.
//!
//! This module contains all user-facing types.
//! Most users only need the re-exports at the crate root.

pub mod awaitable;
pub mod config;
pub mod error;
pub mod handle;
pub mod pool;
pub mod stats;
