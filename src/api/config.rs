//! Pool configuration.

use std::time::Duration;

/// Configuration for a [`CompletionPool`](crate::CompletionPool).
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Slots allocated into the free list at construction (default: 16)
    pub initial_capacity: usize,

    /// Timeout armed on every `create()` (default: none)
    ///
    /// Requires the `tokio` feature; ignored otherwise.
    pub default_timeout: Option<Duration>,

    /// Runtime used for timers and cancellation watchers.
    ///
    /// Falls back to the ambient runtime when unset.
    #[cfg(feature = "tokio")]
    pub runtime: Option<::tokio::runtime::Handle>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            default_timeout: None,
            #[cfg(feature = "tokio")]
            runtime: None,
        }
    }
}

impl PoolConfig {
    /// A config that allocates nothing up front.
    pub fn minimal() -> Self {
        Self {
            initial_capacity: 0,
            ..Self::default()
        }
    }

    /// Builder pattern: set the number of pre-allocated slots.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Builder pattern: arm a timeout on every created source.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Builder pattern: drive timers and watchers on `runtime`.
    #[cfg(feature = "tokio")]
    pub fn with_runtime(mut self, runtime: ::tokio::runtime::Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders() {
        let config = PoolConfig::minimal()
            .with_initial_capacity(4)
            .with_default_timeout(Duration::from_secs(1));
        assert_eq!(config.initial_capacity, 4);
        assert_eq!(config.default_timeout, Some(Duration::from_secs(1)));
        assert_eq!(PoolConfig::minimal().initial_capacity, 0);
    }
}
