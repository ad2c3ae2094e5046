//! Tester reports, aggregation rules, and the rendered quality report.

use serde::{Deserialize, Serialize};

use crate::architect::Handoff;
use crate::directive::Directive;

use super::VerificationItem;

/// How much of the originating handoff document the report quotes.
const HANDOFF_EXCERPT_CHARS: usize = 2000;

/// Verdict of a single tester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TesterStatus {
    Pass,
    Fail,
    Skipped,
}

impl TesterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for TesterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw report handed back by a tester.
///
/// The status is optional because testers often translate loosely structured
/// model output; a report that arrives without one violates the contract and
/// aborts the whole verification run (quality reports are acted upon
/// wholesale, so a partial one is worse than none).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TesterReport {
    /// Verdict. Required for the report to be accepted.
    pub status: Option<TesterStatus>,
    /// What the tester found. May be empty.
    #[serde(default)]
    pub findings: String,
    /// Concrete defects to fix, if any.
    #[serde(default)]
    pub defects: Vec<String>,
    /// Supporting evidence (logs, command output, screenshots by path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl TesterReport {
    /// A passing report.
    pub fn pass(findings: impl Into<String>) -> Self {
        Self {
            status: Some(TesterStatus::Pass),
            findings: findings.into(),
            ..Default::default()
        }
    }

    /// A failing report.
    pub fn fail(findings: impl Into<String>) -> Self {
        Self {
            status: Some(TesterStatus::Fail),
            findings: findings.into(),
            ..Default::default()
        }
    }

    /// A skipped report (the tester could not evaluate the item).
    pub fn skipped(findings: impl Into<String>) -> Self {
        Self {
            status: Some(TesterStatus::Skipped),
            findings: findings.into(),
            ..Default::default()
        }
    }

    /// Add a defect.
    pub fn with_defect(mut self, defect: impl Into<String>) -> Self {
        self.defects.push(defect.into());
        self
    }

    /// Attach evidence.
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }
}

/// Normalized outcome for one plan item, carrying the item's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedReport {
    /// The plan item id (`qa-...`).
    pub item_id: String,
    /// The plan item's title.
    pub title: String,
    /// Id of the task that was verified.
    pub target_task_id: String,
    /// The mission the tester was given.
    pub mission: String,
    /// The tester's verdict.
    pub status: TesterStatus,
    /// Findings text, defaulting to empty.
    pub findings: String,
    /// Defects, defaulting to an empty list.
    pub defects: Vec<String>,
    /// Evidence, if supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

/// Overall verdict across the whole plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Success,
    Failure,
    Partial,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Partial => "PARTIAL",
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The global quality report: aggregated outcomes plus rendered markdown.
///
/// Purely derived; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub overall_status: OverallStatus,
    pub summary: String,
    pub feature_request: String,
    pub plan: Vec<VerificationItem>,
    pub reports: Vec<AggregatedReport>,
    pub markdown: String,
}

/// Resolve the overall status: any fail wins, then any skip, then success.
pub(crate) fn resolve_overall(reports: &[AggregatedReport]) -> OverallStatus {
    if reports.iter().any(|r| r.status == TesterStatus::Fail) {
        OverallStatus::Failure
    } else if reports.iter().any(|r| r.status == TesterStatus::Skipped) {
        OverallStatus::Partial
    } else {
        OverallStatus::Success
    }
}

/// Templated one-line summary for the resolved status.
pub(crate) fn summary_for(status: OverallStatus, reports: &[AggregatedReport]) -> String {
    match status {
        OverallStatus::Failure => {
            let failing = reports
                .iter()
                .filter(|r| r.status == TesterStatus::Fail)
                .count();
            format!("{failing} tester(s) reported failures; the feature is not ready to ship.")
        }
        OverallStatus::Partial => {
            let skipped = reports
                .iter()
                .filter(|r| r.status == TesterStatus::Skipped)
                .count();
            format!("{skipped} tester(s) skipped their checks; review the gaps before release.")
        }
        OverallStatus::Success => {
            "All testers passed; the deliverables meet the directive.".to_string()
        }
    }
}

pub(crate) fn render_report(
    overall: OverallStatus,
    summary: &str,
    directive: &Directive,
    handoff: &Handoff,
    plan: &[VerificationItem],
    reports: &[AggregatedReport],
) -> String {
    let mut doc = String::new();
    doc.push_str("# Global Quality Report\n\n");
    doc.push_str(&format!("**Overall status:** {overall}\n\n"));
    doc.push_str(&format!("**Summary:** {summary}\n\n"));

    doc.push_str("## Development Context\n\n");
    doc.push_str(&format!("- Feature request: {}\n", handoff.feature_request));
    doc.push_str(&format!("- Directive: {}\n\n", handoff.directive_title));

    doc.push_str("## Test Plan Overview\n\n");
    for item in plan {
        if item.focus_areas.is_empty() {
            doc.push_str(&format!("- **{}**: general quality\n", item.title));
        } else {
            doc.push_str(&format!(
                "- **{}**: focus on {}\n",
                item.title,
                item.focus_areas.join(", ")
            ));
        }
    }
    doc.push('\n');

    doc.push_str("## Tester Findings\n\n");
    for report in reports {
        doc.push_str(&format!("### {} (`{}`)\n\n", report.title, report.item_id));
        doc.push_str(&format!(
            "- Status: {}\n",
            report.status.as_str().to_ascii_uppercase()
        ));
        doc.push_str(&format!("- Mission: {}\n", report.mission));
        if !report.findings.is_empty() {
            doc.push_str(&format!("- Findings: {}\n", report.findings));
        }
        if !report.defects.is_empty() {
            doc.push_str("- Defects:\n");
            for defect in &report.defects {
                doc.push_str(&format!("  - {defect}\n"));
            }
        }
        if let Some(evidence) = &report.evidence {
            doc.push_str(&format!("- Evidence: {evidence}\n"));
        }
        doc.push('\n');
    }

    doc.push_str("## Aggregated Defects\n\n");
    let defects = aggregated_defects(reports);
    if defects.is_empty() {
        doc.push_str("None reported.\n");
    } else {
        for defect in &defects {
            doc.push_str(&format!("- {defect}\n"));
        }
    }
    doc.push('\n');

    if let Some(section) = directive.section("Core Workflow") {
        doc.push_str("## Core Workflow\n\n");
        doc.push_str(&section.content);
        doc.push_str("\n\n");
    }

    doc.push_str("## Handoff Document (excerpt)\n\n");
    doc.push_str("```markdown\n");
    let excerpt: String = handoff.document.chars().take(HANDOFF_EXCERPT_CHARS).collect();
    doc.push_str(&excerpt);
    if !excerpt.ends_with('\n') {
        doc.push('\n');
    }
    doc.push_str("```\n");
    doc
}

/// Union of all defects across reports, exact duplicates removed, order of
/// first appearance preserved.
fn aggregated_defects(reports: &[AggregatedReport]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut defects = Vec::new();
    for report in reports {
        for defect in &report.defects {
            if seen.insert(defect.clone()) {
                defects.push(defect.clone());
            }
        }
    }
    defects
}
