//! Tokio integration: timeouts and external cancellation.
//!
//! Requires the `tokio` feature (on by default). Watchers are spawned onto
//! the runtime configured with [`PoolConfig::with_runtime`](crate::PoolConfig::with_runtime),
//! or the ambient runtime when none is configured. Each watcher holds only a
//! weak reference to its slot and is torn down as soon as the cycle
//! finishes, whoever finished it.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use poolsource::{CancelCause, CancellationToken, CompletionPool};
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let pool = CompletionPool::<u32>::new();
//! let shutdown = CancellationToken::new();
//!
//! let handle = pool.create();
//! let wait = pool
//!     .wait_with_timeout(handle, Duration::from_millis(10), Some(&shutdown))
//!     .unwrap();
//!
//! let err = wait.await.unwrap_err();
//! assert_eq!(err.cancel_cause(), Some(&CancelCause::Timeout(Duration::from_millis(10))));
//! # }
//! ```

mod timeout;
mod watch;

pub use timeout::TimeoutController;
pub use tokio_util::sync::CancellationToken;
