//! Test plan derivation: one verification item per handoff task.

use serde::{Deserialize, Serialize};

use crate::architect::Handoff;
use crate::task::TaskSnapshot;

/// One unit of verification work, derived 1:1 from a handoff task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationItem {
    /// `"qa-"` + the originating task id.
    pub id: String,
    /// Title of the originating task.
    pub title: String,
    /// Instruction for the tester, referencing the task's mission, its
    /// files/artifacts, and the status the Architect reported.
    pub mission: String,
    /// Id of the task this item verifies.
    pub target_task_id: String,
    /// Files the task reported touching (possibly empty).
    pub related_files: Vec<String>,
    /// Union of related files and artifact names, deduplicated.
    pub focus_areas: Vec<String>,
}

/// Derive the full plan from a handoff. Every task gets an item, including
/// failed and blocked ones: a tester confirming that nothing shipped for a
/// failed task is still signal.
pub(crate) fn derive_plan(handoff: &Handoff) -> Vec<VerificationItem> {
    handoff.tasks.iter().map(item_for).collect()
}

fn item_for(task: &TaskSnapshot) -> VerificationItem {
    let related_files = task
        .output
        .as_ref()
        .map(|o| o.files_touched.clone())
        .unwrap_or_default();

    let mut focus_areas = related_files.clone();
    if let Some(output) = &task.output {
        for name in output.artifacts.keys() {
            if !focus_areas.contains(name) {
                focus_areas.push(name.clone());
            }
        }
    }

    let mut mission = format!(
        "Validate the deliverables produced by developer task \"{}\" (mission: {}).",
        task.title, task.mission
    );
    if !focus_areas.is_empty() {
        mission.push_str(&format!(
            " Focus on artifacts/files: {}.",
            focus_areas.join(", ")
        ));
    }
    mission.push_str(&format!(
        " Architect reported status: {}.",
        task.status.as_str().to_ascii_uppercase()
    ));

    VerificationItem {
        id: format!("qa-{}", task.id),
        title: task.title.clone(),
        mission,
        target_task_id: task.id.clone(),
        related_files,
        focus_areas,
    }
}
