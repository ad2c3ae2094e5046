//! Task module - definitions, lifecycle state, and executor outputs.
//!
//! The types here are deliberately plain data: scheduling decisions live in
//! the Architect engine, which owns the mutable records, and callers only
//! ever see deep-copied snapshots.

mod output;
mod state;

pub use output::TaskOutput;
pub use state::{TaskConfig, TaskSnapshot, TaskStatus};

pub(crate) use state::TaskRecord;
