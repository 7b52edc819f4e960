//! Diagnostic emission backend.
//!
//! Errors and warnings go to stderr in debug builds (or with the
//! `diagnostics` feature). Every kind is forwarded to `log` when the `log`
//! feature is enabled; notes never reach stderr.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use super::kind::{Diagnostic, DiagnosticKind};
use super::strict::should_panic_on_warning;

/// Global flag to suppress diagnostic output (for testing).
static DIAGNOSTICS_SUPPRESSED: AtomicBool = AtomicBool::new(false);

/// Suppress all diagnostic output.
pub fn suppress_diagnostics(suppress: bool) {
    DIAGNOSTICS_SUPPRESSED.store(suppress, Ordering::Relaxed);
}

/// Check if diagnostics are suppressed.
pub fn is_suppressed() -> bool {
    DIAGNOSTICS_SUPPRESSED.load(Ordering::Relaxed)
}

/// Emit a diagnostic.
///
/// Warnings panic when strict mode is [`StrictMode::PanicOnWarning`](super::StrictMode).
pub fn emit(diag: &Diagnostic) {
    #[cfg(feature = "log")]
    emit_to_log(diag);

    if is_suppressed() {
        return;
    }

    #[cfg(any(debug_assertions, feature = "diagnostics"))]
    {
        if diag.kind != DiagnosticKind::Note {
            emit_to_stderr(diag);
        }
    }

    if diag.kind == DiagnosticKind::Warning && should_panic_on_warning() {
        panic!(
            "[poolsource][{}] {}\nStrict mode enabled - warnings are fatal.",
            diag.code, diag.message
        );
    }
}

/// Report a protocol violation and panic.
///
/// Used through [`ps_violation!`](crate::ps_violation).
#[cold]
#[track_caller]
pub fn violation(diag: &Diagnostic, detail: fmt::Arguments<'_>) -> ! {
    emit(diag);
    panic!("[poolsource][{}] {}: {}", diag.code, diag.message, detail);
}

/// Internal: emit to stderr.
#[cfg(any(debug_assertions, feature = "diagnostics"))]
fn emit_to_stderr(diag: &Diagnostic) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(
        stderr,
        "[poolsource][{}] {}: {}",
        diag.code,
        diag.kind.prefix(),
        diag.message
    );

    if let Some(note) = diag.note {
        let _ = writeln!(stderr, "  note: {}", note);
    }

    if let Some(help) = diag.help {
        let _ = writeln!(stderr, "  help: {}", help);
    }

    let _ = writeln!(stderr);
}

/// Emit a diagnostic using the log crate.
#[cfg(feature = "log")]
pub fn emit_to_log(diag: &Diagnostic) {
    match diag.kind {
        DiagnosticKind::Error => {
            log::error!(target: "poolsource", "[{}] {}", diag.code, diag.message);
        }
        DiagnosticKind::Warning => {
            log::warn!(target: "poolsource", "[{}] {}", diag.code, diag.message);
        }
        DiagnosticKind::Note => {
            log::trace!(target: "poolsource", "[{}] {}", diag.code, diag.message);
        }
    }

    if let Some(help) = diag.help {
        log::debug!(target: "poolsource", "  help: {}", help);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::kind::{PS003, PS101};

    #[test]
    fn test_suppression() {
        suppress_diagnostics(true);
        assert!(is_suppressed());
        suppress_diagnostics(false);
        assert!(!is_suppressed());
    }

    #[test]
    fn notes_never_panic() {
        emit(&PS101);
    }

    #[test]
    #[should_panic(expected = "PS003")]
    fn violation_panics_with_code() {
        violation(&PS003, format_args!("slot 3 version 7"));
    }
}
