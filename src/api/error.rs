//! Completion outcomes and error types.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Error payload carried by a faulted completion source.
pub type Fault = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Observable state of a completion source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionStatus {
    /// No terminal transition has happened yet.
    Pending,
    /// A producer delivered a value.
    Succeeded,
    /// A producer reported a failure.
    Faulted,
    /// A timeout, external signal or explicit request canceled the source.
    Canceled,
}

impl CompletionStatus {
    /// Returns true for Succeeded, Faulted and Canceled.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Faulted => write!(f, "faulted"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

/// Why a completion source was canceled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelCause {
    /// The armed timeout elapsed first.
    Timeout(Duration),
    /// The externally supplied cancellation signal fired first.
    External,
    /// A producer called `try_set_canceled` with a reason.
    Requested(Arc<str>),
    /// The source was force-disposed while still pending.
    Disposed,
}

impl CancelCause {
    /// Convenience constructor for [`CancelCause::Requested`].
    pub fn requested(reason: impl Into<Arc<str>>) -> Self {
        Self::Requested(reason.into())
    }

    /// Returns true if the cancellation came from a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(after) => write!(f, "timed out after {:?}", after),
            Self::External => write!(f, "canceled by external signal"),
            Self::Requested(reason) => write!(f, "canceled: {}", reason),
            Self::Disposed => write!(f, "disposed before completion"),
        }
    }
}

/// Non-success outcome of a completion source, returned by `consume`.
#[derive(Debug)]
pub enum SourceError {
    /// The producer reported a failure.
    Faulted(Fault),
    /// The source was canceled before a producer completed it.
    Canceled(CancelCause),
}

impl SourceError {
    /// Returns true for cancellation outcomes.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled(_))
    }

    /// The cancellation cause, if this is a cancellation.
    pub fn cancel_cause(&self) -> Option<&CancelCause> {
        match self {
            Self::Canceled(cause) => Some(cause),
            Self::Faulted(_) => None,
        }
    }

    /// The fault payload, if this is a fault.
    pub fn into_fault(self) -> Option<Fault> {
        match self {
            Self::Faulted(fault) => Some(fault),
            Self::Canceled(_) => None,
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Faulted(fault) => write!(f, "completion source faulted: {}", fault),
            Self::Canceled(cause) => write!(f, "completion source {}", cause),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Faulted(fault) => Some(fault.as_ref()),
            Self::Canceled(_) => None,
        }
    }
}

/// Failure to attach a timeout or cancellation watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchError {
    /// Neither a configured nor an ambient Tokio runtime was available.
    NoRuntime,
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuntime => write!(f, "no Tokio runtime available to drive the watcher"),
        }
    }
}

impl std::error::Error for WatchError {}
