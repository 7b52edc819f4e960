//! Diagnostic kinds and predefined codes.

/// The severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A caller bug. Always followed by a panic.
    Error,
    /// Something is probably misconfigured.
    Warning,
    /// Lifecycle information. Only forwarded to `log`.
    Note,
}

impl DiagnosticKind {
    /// Get the display prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Note => "note",
        }
    }
}

/// A diagnostic message with code, message, and optional context.
///
/// Diagnostic codes follow the pattern:
/// - `PS0xx` - Protocol violations (caller bugs)
/// - `PS1xx` - Stale handles and lifecycle notes
/// - `PS2xx` - Runtime integration issues
/// - `PS9xx` - Internal errors
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level.
    pub kind: DiagnosticKind,
    /// Diagnostic code (e.g., "PS001").
    pub code: &'static str,
    /// Primary message.
    pub message: &'static str,
    /// Optional additional context.
    pub note: Option<&'static str>,
    /// Optional fix suggestion.
    pub help: Option<&'static str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub const fn error(code: &'static str, message: &'static str) -> Self {
        Self::with_kind(DiagnosticKind::Error, code, message)
    }

    /// Create a new warning diagnostic.
    pub const fn warning(code: &'static str, message: &'static str) -> Self {
        Self::with_kind(DiagnosticKind::Warning, code, message)
    }

    /// Create a new note diagnostic.
    pub const fn note(code: &'static str, message: &'static str) -> Self {
        Self::with_kind(DiagnosticKind::Note, code, message)
    }

    const fn with_kind(kind: DiagnosticKind, code: &'static str, message: &'static str) -> Self {
        Self {
            kind,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Add a note to this diagnostic.
    pub const fn with_note(mut self, note: &'static str) -> Self {
        self.note = Some(note);
        self
    }

    /// Add a help message to this diagnostic.
    pub const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// =============================================================================
// Predefined diagnostics (PS0xx - Protocol violations)
// =============================================================================

/// PS001: A second continuation was registered for the same cycle.
pub const PS001: Diagnostic = Diagnostic::error(
    "PS001",
    "continuation already registered for this completion cycle"
).with_note("a completion source supports exactly one subscriber per cycle")
 .with_help("await the source once, or register a single callback");

/// PS002: Consume was called before the source reached a terminal state.
pub const PS002: Diagnostic = Diagnostic::error(
    "PS002",
    "result consumed before the completion source finished"
).with_note("consume() is only valid once status() is Succeeded, Faulted or Canceled")
 .with_help("register a continuation or await the source instead of polling");

/// PS003: A stale handle was used where a live one is required.
pub const PS003: Diagnostic = Diagnostic::error(
    "PS003",
    "stale handle used to consume or subscribe"
).with_note("the slot has already been consumed and recycled for a newer cycle")
 .with_help("each handle may be consumed exactly once");

/// PS004: A slot was pushed onto the free list while already pooled.
pub const PS004: Diagnostic = Diagnostic::error(
    "PS004",
    "slot returned to the pool twice"
).with_note("a slot is either checked out or pooled, never both");

/// PS005: A fired timeout controller was armed again.
pub const PS005: Diagnostic = Diagnostic::error(
    "PS005",
    "timeout controller re-armed after it fired"
).with_note("a fired timer could deliver a late cancellation to a newer cycle")
 .with_help("replace the controller when reset() returns false");

/// PS006: An awaitable was polled after it already produced its output.
pub const PS006: Diagnostic = Diagnostic::error(
    "PS006",
    "awaitable polled after completion"
);

/// PS007: A handle does not belong to this pool.
pub const PS007: Diagnostic = Diagnostic::error(
    "PS007",
    "handle does not refer to a slot of this pool"
).with_help("handles are only valid with the pool that created them");

// =============================================================================
// Predefined diagnostics (PS1xx - Lifecycle)
// =============================================================================

/// PS101: A completion attempt lost the race or used a stale handle.
pub const PS101: Diagnostic = Diagnostic::note(
    "PS101",
    "completion attempt ignored: stale handle or already finished"
);

/// PS102: An in-flight source was disposed before it finished.
pub const PS102: Diagnostic = Diagnostic::note(
    "PS102",
    "in-flight completion source disposed before it finished"
);

// =============================================================================
// Predefined diagnostics (PS2xx - Runtime integration)
// =============================================================================

/// PS201: A timer or watcher was requested without a Tokio runtime.
pub const PS201: Diagnostic = Diagnostic::warning(
    "PS201",
    "no Tokio runtime available for timeout or cancellation watcher"
).with_note("watchers are spawned onto the configured or ambient runtime")
 .with_help("call from within a runtime, or set PoolConfig::with_runtime");

/// PS202: A pool's default timeout was skipped because no runtime was available.
pub const PS202: Diagnostic = Diagnostic::note(
    "PS202",
    "default timeout skipped: no Tokio runtime available"
).with_note("reported once per pool; sources are still created without a timer")
 .with_help("create sources from within a runtime, or set PoolConfig::with_runtime");

// =============================================================================
// Predefined diagnostics (PS9xx - Internal)
// =============================================================================

/// PS901: Internal pool bookkeeping error.
pub const PS901: Diagnostic = Diagnostic::error(
    "PS901",
    "internal pool bookkeeping error"
).with_note("this indicates a bug in poolsource");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predefined_kinds() {
        assert_eq!(PS001.kind, DiagnosticKind::Error);
        assert_eq!(PS101.kind, DiagnosticKind::Note);
        assert_eq!(PS201.kind, DiagnosticKind::Warning);
        assert_eq!(PS202.kind, DiagnosticKind::Note);
        assert!(PS005.help.is_some());
        assert_eq!(PS006.note, None);
    }
}
