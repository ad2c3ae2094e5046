//! Quasar - the verification planner and aggregator.
//!
//! # Responsibilities
//! 1. Derive one verification item per handoff task (whatever its terminal
//!    status)
//! 2. Drive a caller-supplied tester over the plan, strictly in order
//! 3. Aggregate per-item outcomes into one overall verdict and render the
//!    global quality report
//!
//! Verification runs serially on purpose: tester feedback order stays
//! deterministic and reproducible across runs, and a quality report is meant
//! to be acted upon wholesale. For the same reason a tester that violates its
//! contract aborts the entire run instead of being skipped over.

mod engine;
mod plan;
mod report;

pub use engine::{Quasar, QuasarError};
pub use plan::VerificationItem;
pub use report::{AggregatedReport, OverallStatus, QualityReport, TesterReport, TesterStatus};

use std::future::Future;

use async_trait::async_trait;

/// Strategy trait for evaluating one verification item.
///
/// Implementations typically hand the item's mission to a model or a test
/// harness and translate what comes back into a [`TesterReport`].
#[async_trait]
pub trait Tester: Send + Sync {
    /// Evaluate one plan item.
    async fn run(&self, item: &VerificationItem) -> anyhow::Result<TesterReport>;
}

/// Plain async closures work as testers without a wrapper type.
#[async_trait]
impl<F, Fut> Tester for F
where
    F: Fn(VerificationItem) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<TesterReport>> + Send,
{
    async fn run(&self, item: &VerificationItem) -> anyhow::Result<TesterReport> {
        (self)(item.clone()).await
    }
}
