//! Coded diagnostics for completion-source misuse.
//!
//! This module provides:
//! - **Protocol violations**: caller bugs reported with a code, then a panic
//! - **Lifecycle notes**: stale completions and forced disposals, sent to `log`
//! - **Runtime warnings**: timers requested without a Tokio runtime
//! - **Strict mode**: optional panic-on-warning for CI
//!
//! ## Diagnostic Codes
//!
//! | Code  | Meaning                        |
//! |-------|--------------------------------|
//! | PS0xx | Protocol violations            |
//! | PS1xx | Stale handles and lifecycle    |
//! | PS2xx | Runtime integration            |
//! | PS9xx | Internal errors                |

#[macro_use]
pub mod macros;
pub mod emit;
pub mod kind;
pub mod strict;

pub use emit::{emit, suppress_diagnostics};
pub use kind::{Diagnostic, DiagnosticKind};
pub use strict::{init_from_env, set_strict_mode, strict_mode, StrictMode, StrictModeGuard};

pub use kind::{PS001, PS002, PS003, PS004, PS005, PS006, PS007, PS101, PS102, PS201, PS202, PS901};
