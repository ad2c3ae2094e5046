//! Architect - the task-graph execution engine.
//!
//! # Responsibilities
//! 1. Own the registry of sub-agent tasks and their declared dependencies
//! 2. Run caller-supplied executors in dependency order, one concurrent wave
//!    at a time
//! 3. Propagate failures to dependents as `Blocked`
//! 4. Produce the handoff bundle consumed by the verification stage
//!
//! ```text
//! register_task() x N -> execute() -> Handoff -> Quasar
//! ```
//!
//! The engine performs none of the actual work: executors are opaque async
//! strategies (typically wrapping a model or tool call) and the Architect
//! only sequences, tracks, and reports on them.

mod engine;
mod handoff;

pub use engine::{Architect, ArchitectError, ExecuteOptions};
pub use handoff::Handoff;

use std::future::Future;

use async_trait::async_trait;

use crate::task::TaskOutput;

/// Strategy trait for the opaque unit of work behind one task.
///
/// # Contract
/// - Returns `Ok(output)` on success; the output's `summary` must be
///   non-empty or the engine fails the task
/// - Returns `Err` on failure; the message is recorded on the task record
/// - Never panics; all failures are returned as `Err`
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Perform the task's work.
    async fn run(&self) -> anyhow::Result<TaskOutput>;
}

/// Plain async closures work as executors without a wrapper type.
#[async_trait]
impl<F, Fut> TaskExecutor for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<TaskOutput>> + Send,
{
    async fn run(&self) -> anyhow::Result<TaskOutput> {
        (self)().await
    }
}
