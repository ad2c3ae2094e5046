//! The handoff bundle: structured task results plus the rendered markdown
//! document that the verification stage (and humans) read.
//!
//! Rendering is a pure function from data to string. Identical inputs produce
//! byte-identical documents, which keeps golden-string tests honest. Task
//! timestamps are deliberately left out of the document for the same reason.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::directive::Directive;
use crate::task::TaskSnapshot;

/// Fixed closing line of every handoff document.
pub const HANDOFF_TRAILER: &str = "End of handoff. Verification owns the next step.";

/// Immutable result of one Architect run.
///
/// Produced exactly once per run and consumed read-only by the verification
/// stage. The snapshots inside are deep copies; nothing here aliases the
/// engine's registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Handoff {
    /// Fresh id for this run, for log correlation.
    pub run_id: Uuid,
    /// The feature request the run was asked to deliver.
    pub feature_request: String,
    /// Title of the directive that governed the run.
    pub directive_title: String,
    /// Terminal state of every task, in stable (id) order.
    pub tasks: Vec<TaskSnapshot>,
    /// Union of all touched files, deduplicated, first appearance first.
    pub files_touched: Vec<String>,
    /// The rendered handoff document.
    pub document: String,
}

impl Handoff {
    pub(crate) fn new(
        feature_request: &str,
        directive: &Directive,
        tasks: Vec<TaskSnapshot>,
    ) -> Self {
        let files_touched = files_union(&tasks);
        let document = render_document(feature_request, directive, &tasks, &files_touched);
        Self {
            run_id: Uuid::new_v4(),
            feature_request: feature_request.to_string(),
            directive_title: directive.title.clone(),
            tasks,
            files_touched,
            document,
        }
    }
}

/// Deduplicated union of every task's touched files, preserving the order of
/// first appearance across tasks.
fn files_union(tasks: &[TaskSnapshot]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut union = Vec::new();
    for task in tasks {
        let Some(output) = &task.output else { continue };
        for path in &output.files_touched {
            if seen.insert(path.clone()) {
                union.push(path.clone());
            }
        }
    }
    union
}

fn render_document(
    feature_request: &str,
    directive: &Directive,
    tasks: &[TaskSnapshot],
    files_touched: &[String],
) -> String {
    let mut doc = String::new();
    doc.push_str("# Development Handoff\n\n");
    doc.push_str(&format!("**Feature request:** {feature_request}\n\n"));
    doc.push_str(&format!("**Directive:** {}\n\n", directive.title));

    doc.push_str("## Sub-Agent Missions\n\n");
    for task in tasks {
        doc.push_str(&format!(
            "- **{}** (`{}`): {}\n",
            task.title, task.id, task.mission
        ));
    }
    doc.push('\n');

    doc.push_str("## Execution Results\n\n");
    for task in tasks {
        doc.push_str(&format!("### {} (`{}`)\n\n", task.title, task.id));
        doc.push_str(&format!(
            "- Status: {}\n",
            task.status.as_str().to_ascii_uppercase()
        ));
        if let Some(output) = &task.output {
            doc.push_str(&format!("- Summary: {}\n", output.summary));
            if let Some(details) = &output.details {
                doc.push_str(&format!("- Details: {details}\n"));
            }
            if !output.files_touched.is_empty() {
                doc.push_str(&format!("- Files: {}\n", output.files_touched.join(", ")));
            }
            if !output.artifacts.is_empty() {
                doc.push_str("- Artifacts:\n");
                for (name, description) in &output.artifacts {
                    doc.push_str(&format!("  - {name}: {description}\n"));
                }
            }
            if let Some(notes) = &output.notes {
                doc.push_str(&format!("- Notes: {notes}\n"));
            }
        }
        if let Some(error) = &task.error {
            doc.push_str(&format!("- Error: {error}\n"));
        }
        doc.push('\n');
    }

    doc.push_str("## Files Modified\n\n");
    if files_touched.is_empty() {
        doc.push_str("(none reported)\n");
    } else {
        for path in files_touched {
            doc.push_str(&format!("- {path}\n"));
        }
    }
    doc.push('\n');

    // Quote the directive's own handoff instructions verbatim, if present.
    if let Some(section) = directive.section("Output & Handoff") {
        doc.push_str("## Output & Handoff\n\n");
        doc.push_str(&section.content);
        doc.push_str("\n\n");
    }

    doc.push_str("---\n");
    doc.push_str(HANDOFF_TRAILER);
    doc.push('\n');
    doc
}
