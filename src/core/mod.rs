//! Core completion machinery.
//!
//! Internal module - not part of the public API.

pub(crate) mod registration;
pub(crate) mod slot;
