//! Diagnostic macros.

/// Report a protocol violation and panic.
///
/// # Example
///
/// ```rust,ignore
/// ps_violation!(PS001, "slot {} version {}", index, version);
/// ```
#[macro_export]
macro_rules! ps_violation {
    ($code:ident) => {
        $crate::diagnostics::emit::violation(
            &$crate::diagnostics::$code,
            format_args!("no further detail"),
        )
    };
    ($code:ident, $($arg:tt)+) => {
        $crate::diagnostics::emit::violation(
            &$crate::diagnostics::$code,
            format_args!($($arg)+),
        )
    };
}

/// Emit a predefined diagnostic by code.
#[macro_export]
macro_rules! ps_emit {
    ($code:ident) => {{
        $crate::diagnostics::emit::emit(&$crate::diagnostics::$code);
    }};
}

/// Lifecycle trace, forwarded to `log::trace!` when the `log` feature is on.
macro_rules! ps_trace {
    ($($arg:tt)+) => {{
        #[cfg(feature = "log")]
        {
            log::trace!(target: "poolsource", $($arg)+);
        }
        #[cfg(not(feature = "log"))]
        {
            let _ = format_args!($($arg)+);
        }
    }};
}

/// Lifecycle event worth surfacing at debug level.
macro_rules! ps_debug {
    ($($arg:tt)+) => {{
        #[cfg(feature = "log")]
        {
            log::debug!(target: "poolsource", $($arg)+);
        }
        #[cfg(not(feature = "log"))]
        {
            let _ = format_args!($($arg)+);
        }
    }};
}
