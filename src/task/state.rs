//! Task lifecycle state owned by the Architect scheduler.
//!
//! # State Machine
//! ```text
//! Pending -> Running -> Completed
//!                   \-> Failed
//!        \-> Blocked   (a dependency failed or was itself blocked)
//! ```
//!
//! `Pending` is the only initial state. `Running`, `Completed`, and `Failed`
//! are entered exclusively by the scheduling loop; `Blocked` is reached only
//! through cascading propagation from a failed or blocked dependency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TaskOutput;

/// Caller-supplied definition of one sub-agent task.
///
/// Registered with the Architect before execution begins. Dependency ids are
/// not validated at registration time (tasks may arrive in any order); the
/// engine checks them when `execute()` starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Unique id within one Architect instance.
    pub id: String,
    /// Short human-readable title.
    pub title: String,
    /// Free-text description of what the task must accomplish.
    pub mission: String,
    /// Ids of tasks that must complete before this one may start.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl TaskConfig {
    /// Create a config with no dependencies.
    pub fn new(id: impl Into<String>, title: impl Into<String>, mission: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            mission: mission.into(),
            dependencies: Vec::new(),
        }
    }

    /// Add a dependency on another task id.
    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    /// Add several dependencies at once.
    pub fn with_dependencies<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(ids.into_iter().map(Into::into));
        self
    }
}

/// Status of a task in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for its turn.
    Pending,
    /// Dispatched in the current wave.
    Running,
    /// Executor finished and the output was accepted.
    Completed,
    /// Executor failed, or its output violated the contract.
    Failed,
    /// A dependency failed or was blocked; the task never ran.
    Blocked,
}

impl TaskStatus {
    /// Check if the task can make no further progress.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Blocked)
    }

    /// Lowercase name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal mutable record for one registered task.
///
/// Owned exclusively by the Architect's scheduling loop. Nothing outside the
/// engine may mutate a record once a run begins; external callers only ever
/// receive [`TaskSnapshot`] copies.
#[derive(Debug, Clone)]
pub(crate) struct TaskRecord {
    pub id: String,
    pub title: String,
    pub mission: String,
    pub dependencies: Vec<String>,
    pub status: TaskStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub output: Option<TaskOutput>,
    pub error: Option<String>,
}

impl TaskRecord {
    pub(crate) fn new(config: TaskConfig) -> Self {
        Self {
            id: config.id,
            title: config.title,
            mission: config.mission,
            dependencies: config.dependencies,
            status: TaskStatus::Pending,
            started_at: None,
            finished_at: None,
            output: None,
            error: None,
        }
    }

    /// Mark the task dispatched and stamp its start time.
    pub(crate) fn start(&mut self) {
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Accept a normalized output and complete the task.
    pub(crate) fn complete(&mut self, output: TaskOutput) {
        self.status = TaskStatus::Completed;
        self.output = Some(output);
    }

    /// Fail the task, recording the error message.
    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        self.status = TaskStatus::Failed;
        self.error = Some(reason.into());
    }

    /// Block the task because `dependency` failed or was blocked.
    ///
    /// Blocked tasks never ran, so this also stamps `finished_at`.
    pub(crate) fn block(&mut self, dependency: &str) {
        self.status = TaskStatus::Blocked;
        self.error = Some(format!("Blocked by dependency \"{dependency}\""));
        self.finished_at = Some(Utc::now());
    }

    /// Stamp the end timestamp. Called for every settled task, pass or fail.
    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Deep-copy the record into an immutable snapshot.
    pub(crate) fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id.clone(),
            title: self.title.clone(),
            mission: self.mission.clone(),
            dependencies: self.dependencies.clone(),
            status: self.status,
            started_at: self.started_at,
            finished_at: self.finished_at,
            output: self.output.clone(),
            error: self.error.clone(),
        }
    }
}

/// Immutable, deep-copied view of one task's state.
///
/// Snapshots are what callers see in a handoff; mutating one has no effect on
/// the engine's registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: String,
    pub title: String,
    pub mission: String,
    pub dependencies: Vec<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<TaskOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
