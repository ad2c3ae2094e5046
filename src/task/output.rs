//! Output reported by a task executor when its mission finishes.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// What a sub-agent reports back after doing its work.
///
/// # Invariants
/// - `summary` must be non-empty for the output to be accepted. The Architect
///   enforces this when a task settles; a violation fails that task, not the
///   whole run.
/// - `files_touched` is deduplicated (first appearance wins) before the
///   output is stored on the task record.
///
/// Artifacts are keyed by name; inserting the same name twice keeps the last
/// description. Using a `BTreeMap` keeps rendering order deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskOutput {
    /// One-line account of what was accomplished. Required.
    pub summary: String,

    /// Longer free-form description, if the executor has more to say.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Paths the task created or modified.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files_touched: Vec<String>,

    /// Named artifacts with a short description each.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub artifacts: BTreeMap<String, String>,

    /// Anything the next stage should know (caveats, follow-ups).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TaskOutput {
    /// Create an output with just a summary.
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Default::default()
        }
    }

    /// Attach a longer description.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Record one touched file.
    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.files_touched.push(path.into());
        self
    }

    /// Record several touched files.
    pub fn with_files<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files_touched.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Record a named artifact. A repeated name overwrites the description.
    pub fn with_artifact(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.artifacts.insert(name.into(), description.into());
        self
    }

    /// Attach free-form notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Whether the required summary is actually present.
    pub(crate) fn has_summary(&self) -> bool {
        !self.summary.trim().is_empty()
    }

    /// Dedupe `files_touched`, keeping the first appearance of each path.
    pub(crate) fn normalized(mut self) -> Self {
        let mut seen = HashSet::new();
        self.files_touched.retain(|path| seen.insert(path.clone()));
        self
    }
}
