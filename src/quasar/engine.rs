//! Sequential test driver: runs the plan through a tester and aggregates.

use crate::architect::Handoff;
use crate::directive::Directive;

use super::plan::derive_plan;
use super::report::{render_report, resolve_overall, summary_for};
use super::{AggregatedReport, QualityReport, Tester, VerificationItem};

/// Verification-level errors. Any of these aborts `execute_tests` as a
/// whole; no partial quality report is ever returned.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuasarError {
    #[error("tester report for \"{item}\" is missing a status")]
    InvalidTesterReport { item: String },

    #[error("tester for \"{item}\" failed: {message}")]
    TesterFailed { item: String, message: String },
}

/// The verification planner/aggregator.
///
/// Construction eagerly derives the test plan from the handoff, so callers
/// can inspect (or log) the plan before committing to a run.
pub struct Quasar {
    directive: Directive,
    handoff: Handoff,
    plan: Vec<VerificationItem>,
}

impl Quasar {
    /// Build the planner from the directive and a completed handoff.
    pub fn new(directive: Directive, handoff: Handoff) -> Self {
        let plan = derive_plan(&handoff);
        tracing::debug!(items = plan.len(), run_id = %handoff.run_id, "derived test plan");
        Self {
            directive,
            handoff,
            plan,
        }
    }

    /// The derived plan, one item per handoff task, in handoff order.
    pub fn plan(&self) -> &[VerificationItem] {
        &self.plan
    }

    /// The handoff under verification.
    pub fn handoff(&self) -> &Handoff {
        &self.handoff
    }

    /// Run every plan item through the tester and aggregate the outcome.
    ///
    /// Items are processed strictly in order, never concurrently, so tester
    /// feedback order is deterministic across runs.
    ///
    /// # Errors
    /// - [`QuasarError::TesterFailed`] if the tester itself errors
    /// - [`QuasarError::InvalidTesterReport`] if a report has no status
    pub async fn execute_tests<T>(&self, tester: &T) -> Result<QualityReport, QuasarError>
    where
        T: Tester + ?Sized,
    {
        let mut reports = Vec::with_capacity(self.plan.len());
        for item in &self.plan {
            tracing::debug!(item = %item.id, "running tester");
            let raw = tester
                .run(item)
                .await
                .map_err(|e| QuasarError::TesterFailed {
                    item: item.id.clone(),
                    message: e.to_string(),
                })?;
            let status = raw.status.ok_or_else(|| QuasarError::InvalidTesterReport {
                item: item.id.clone(),
            })?;
            tracing::info!(item = %item.id, status = %status, "tester finished");
            reports.push(AggregatedReport {
                item_id: item.id.clone(),
                title: item.title.clone(),
                target_task_id: item.target_task_id.clone(),
                mission: item.mission.clone(),
                status,
                findings: raw.findings,
                defects: raw.defects,
                evidence: raw.evidence,
            });
        }

        let overall_status = resolve_overall(&reports);
        let summary = summary_for(overall_status, &reports);
        tracing::info!(status = %overall_status, "verification finished");

        let markdown = render_report(
            overall_status,
            &summary,
            &self.directive,
            &self.handoff,
            &self.plan,
            &reports,
        );
        Ok(QualityReport {
            overall_status,
            summary,
            feature_request: self.handoff.feature_request.clone(),
            plan: self.plan.clone(),
            reports,
            markdown,
        })
    }
}
