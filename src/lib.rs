//! # poolsource
//!
//! Pooled, version-guarded completion sources for async code.
//!
//! ## Features
//!
//! - Reusable completion slots, recycled after their result is consumed
//! - `(index, version)` handles: late completions from timers, watchers or
//!   slow producers are rejected instead of corrupting a newer cycle
//! - First terminal transition wins (`try_set_result`, `try_set_canceled`,
//!   `try_set_fault`)
//! - One continuation per cycle: a callback or an awaiting task
//! - Timeouts and external cancellation signals raced against each other
//!   (`tokio` feature)
//! - A lock-free pool of reference tuples for continuation state
//! - Coded diagnostics for protocol violations
//!
//! ## Quick Start
//!
//! ```rust
//! use poolsource::{CompletionPool, CompletionStatus};
//!
//! let pool = CompletionPool::<u32>::new();
//!
//! let handle = pool.create();
//! let completer = pool.completer(handle);
//!
//! std::thread::spawn(move || {
//!     completer.try_set_result(42);
//! })
//! .join()
//! .unwrap();
//!
//! assert_eq!(pool.status(handle), CompletionStatus::Succeeded);
//! assert_eq!(pool.consume(handle).unwrap(), 42);
//! ```

#[macro_use]
pub mod diagnostics;

pub mod api;
pub mod pools;

mod core;
mod sync;

#[cfg(feature = "tokio")]
pub mod tokio;

// Re-export public API at crate root for convenience
pub use api::awaitable::Awaitable;
pub use api::config::PoolConfig;
pub use api::error::{CancelCause, CompletionStatus, Fault, SourceError, WatchError};
pub use api::handle::{Completer, Handle};
pub use api::pool::CompletionPool;
pub use api::stats::PoolStats;

// Reference tuples
pub use pools::tuple::{RefTuple, RefTuple1, RefTuple2, RefTuple3, TuplePool, TuplePoolStats};

// Diagnostics
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use diagnostics::{set_strict_mode, StrictMode, StrictModeGuard};
pub use diagnostics::{PS001, PS002, PS003, PS004, PS005, PS006, PS007, PS101, PS102, PS201, PS202, PS901};

// Tokio integration
#[cfg(feature = "tokio")]
pub use crate::tokio::{CancellationToken, TimeoutController};
