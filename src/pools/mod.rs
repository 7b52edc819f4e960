//! Free lists and pooled helper objects.

pub(crate) mod active_list;
pub(crate) mod free_list;
pub mod tuple;

pub use tuple::{RefTuple, RefTuple1, RefTuple2, RefTuple3, TuplePool, TuplePoolStats, DEFAULT_MAX_RETAINED};
