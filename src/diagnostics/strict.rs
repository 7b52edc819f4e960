//! Strict mode for diagnostics.
//!
//! Protocol violations always panic. Strict mode only decides what happens
//! to warnings, such as a watcher requested without a runtime: in CI it is
//! useful to turn them into panics too.

use std::sync::atomic::{AtomicBool, Ordering};

/// Environment variable read by [`init_from_env`].
pub const STRICT_ENV: &str = "POOLSOURCE_STRICT";

/// How warnings are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrictMode {
    /// Report warnings and carry on.
    #[default]
    Warn,
    /// Report warnings, then panic.
    PanicOnWarning,
}

impl StrictMode {
    /// Parse a mode name: `warn`/`0`/`false` or `panic`/`1`/`true`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "warn" | "0" | "false" | "off" => Some(Self::Warn),
            "panic" | "1" | "true" | "on" => Some(Self::PanicOnWarning),
            _ => None,
        }
    }
}

static WARNINGS_FATAL: AtomicBool = AtomicBool::new(false);

/// Set the process-wide strict mode.
pub fn set_strict_mode(mode: StrictMode) {
    WARNINGS_FATAL.store(mode == StrictMode::PanicOnWarning, Ordering::Relaxed);
}

/// Current process-wide strict mode.
pub fn strict_mode() -> StrictMode {
    if should_panic_on_warning() {
        StrictMode::PanicOnWarning
    } else {
        StrictMode::Warn
    }
}

/// True when warnings are fatal.
pub fn should_panic_on_warning() -> bool {
    WARNINGS_FATAL.load(Ordering::Relaxed)
}

/// Switches strict mode for a scope and restores the previous mode on drop.
#[must_use = "strict mode is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct StrictModeGuard {
    previous: StrictMode,
}

impl StrictModeGuard {
    /// Switch to `mode` until the guard is dropped.
    pub fn new(mode: StrictMode) -> Self {
        let previous = strict_mode();
        set_strict_mode(mode);
        Self { previous }
    }

    /// Make warnings fatal until the guard is dropped.
    pub fn panic_on_warning() -> Self {
        Self::new(StrictMode::PanicOnWarning)
    }
}

impl Drop for StrictModeGuard {
    fn drop(&mut self) {
        set_strict_mode(self.previous);
    }
}

/// Apply the mode named by `POOLSOURCE_STRICT`, if it is set and valid.
///
/// Returns the mode applied.
pub fn init_from_env() -> Option<StrictMode> {
    let mode = std::env::var(STRICT_ENV)
        .ok()
        .and_then(|value| StrictMode::parse(&value))?;
    set_strict_mode(mode);
    Some(mode)
}
