//! Wave-based scheduling over the task registry.
//!
//! # Scheduling Loop
//! 1. A task is *ready* iff it is pending and every dependency completed.
//! 2. Each wave dispatches all ready executors together and awaits them
//!    together; no task in a wave sees a wave-mate's result.
//! 3. If nothing is ready but pending tasks remain, tasks with a failed or
//!    blocked dependency become `Blocked`.
//! 4. If neither step makes progress, the remaining pending set is an
//!    unresolvable cycle and the run fails.
//!
//! The registry is mutated only between waves, so readiness scans always
//! observe a fully settled wave.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future;
use tokio_util::sync::CancellationToken;

use crate::directive::Directive;
use crate::task::{TaskConfig, TaskRecord, TaskStatus};

use super::{Handoff, TaskExecutor};

/// Configuration errors, all fatal to the run.
///
/// These are raised synchronously, before any executor is dispatched; no
/// partial handoff is ever produced for them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArchitectError {
    #[error("task \"{0}\" is already registered")]
    DuplicateTask(String),

    #[error("task \"{0}\" depends on itself")]
    SelfDependency(String),

    #[error("no tasks registered; nothing to execute")]
    NoTasks,

    #[error("task \"{task}\" depends on unknown task \"{dependency}\"")]
    UnknownDependency { task: String, dependency: String },

    #[error("circular dependency among tasks: {0}")]
    CircularDependency(String),
}

/// Per-run options for [`Architect::execute_with`].
#[derive(Clone, Default)]
pub struct ExecuteOptions {
    /// Cooperative cancellation. When the token fires, tasks that have not
    /// been dispatched yet are failed instead of run. Tasks already in
    /// flight are still awaited.
    pub cancel_token: Option<CancellationToken>,
}

/// The task-graph executor.
///
/// Owns a mutable registry of tasks keyed by id. The map is a `BTreeMap` so
/// every iteration (mission lists, execution results, file unions) is stable
/// and independent of registration order.
pub struct Architect {
    directive: Directive,
    tasks: BTreeMap<String, TaskRecord>,
    executors: BTreeMap<String, Arc<dyn TaskExecutor>>,
}

impl Architect {
    /// Create an engine bound to a parsed directive.
    pub fn new(directive: Directive) -> Self {
        Self {
            directive,
            tasks: BTreeMap::new(),
            executors: BTreeMap::new(),
        }
    }

    /// The directive this engine quotes in its handoff document.
    pub fn directive(&self) -> &Directive {
        &self.directive
    }

    /// Number of registered tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Register a task and the executor that will perform it.
    ///
    /// Dependency ids are *not* resolved here: tasks may be registered in any
    /// order, and unknown ids surface when `execute()` starts.
    ///
    /// # Errors
    /// - [`ArchitectError::DuplicateTask`] if the id is already registered
    /// - [`ArchitectError::SelfDependency`] if the task depends on itself
    pub fn register_task(
        &mut self,
        config: TaskConfig,
        executor: impl TaskExecutor + 'static,
    ) -> Result<(), ArchitectError> {
        if self.tasks.contains_key(&config.id) {
            return Err(ArchitectError::DuplicateTask(config.id));
        }
        if config.dependencies.iter().any(|dep| dep == &config.id) {
            return Err(ArchitectError::SelfDependency(config.id));
        }
        tracing::debug!(task = %config.id, deps = config.dependencies.len(), "registered task");
        self.executors.insert(config.id.clone(), Arc::new(executor));
        self.tasks.insert(config.id.clone(), TaskRecord::new(config));
        Ok(())
    }

    /// Run every registered task to a terminal state and build the handoff.
    pub async fn execute(&mut self, feature_request: &str) -> Result<Handoff, ArchitectError> {
        self.execute_with(feature_request, ExecuteOptions::default())
            .await
    }

    /// Like [`execute`](Self::execute), with per-run options.
    ///
    /// # Errors
    /// - [`ArchitectError::NoTasks`] if nothing was registered
    /// - [`ArchitectError::UnknownDependency`] if a dependency id was never
    ///   registered
    /// - [`ArchitectError::CircularDependency`] if the pending set can make
    ///   no progress
    pub async fn execute_with(
        &mut self,
        feature_request: &str,
        options: ExecuteOptions,
    ) -> Result<Handoff, ArchitectError> {
        if self.tasks.is_empty() {
            return Err(ArchitectError::NoTasks);
        }
        for record in self.tasks.values() {
            for dep in &record.dependencies {
                if !self.tasks.contains_key(dep) {
                    return Err(ArchitectError::UnknownDependency {
                        task: record.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        tracing::info!(
            tasks = self.tasks.len(),
            feature_request,
            "starting task-graph execution"
        );

        while self.tasks.values().any(|t| t.status == TaskStatus::Pending) {
            if let Some(token) = &options.cancel_token {
                if token.is_cancelled() {
                    tracing::warn!("run cancelled; failing undispatched tasks");
                    self.fail_pending("Run cancelled before the task was dispatched");
                    break;
                }
            }

            let ready = self.ready_tasks();
            if !ready.is_empty() {
                self.run_wave(&ready).await;
                continue;
            }

            if self.block_stalled() {
                continue;
            }

            // Nothing ready, nothing newly blocked: the pending remainder is
            // a cycle.
            let remaining: Vec<&str> = self
                .tasks
                .values()
                .filter(|t| t.status == TaskStatus::Pending)
                .map(|t| t.id.as_str())
                .collect();
            return Err(ArchitectError::CircularDependency(remaining.join(", ")));
        }

        let handoff = Handoff::new(
            feature_request,
            &self.directive,
            self.tasks.values().map(TaskRecord::snapshot).collect(),
        );
        tracing::info!(
            run_id = %handoff.run_id,
            files = handoff.files_touched.len(),
            "task-graph execution finished"
        );
        Ok(handoff)
    }

    /// Ids of tasks that are pending with every dependency completed.
    fn ready_tasks(&self) -> Vec<String> {
        self.tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .filter(|t| {
                t.dependencies.iter().all(|dep| {
                    self.tasks
                        .get(dep)
                        .map(|d| d.status == TaskStatus::Completed)
                        .unwrap_or(false)
                })
            })
            .map(|t| t.id.clone())
            .collect()
    }

    /// Dispatch one wave: start all ready tasks, await them together, then
    /// settle every result before the next readiness scan.
    async fn run_wave(&mut self, ready: &[String]) {
        tracing::info!(wave = ready.len(), tasks = ?ready, "dispatching wave");

        let mut jobs = Vec::with_capacity(ready.len());
        for id in ready {
            let Some(executor) = self.executors.get(id).cloned() else {
                continue;
            };
            if let Some(record) = self.tasks.get_mut(id) {
                record.start();
                let id = id.clone();
                jobs.push(async move { (id, executor.run().await) });
            }
        }

        let settled = future::join_all(jobs).await;

        for (id, outcome) in settled {
            let Some(record) = self.tasks.get_mut(&id) else {
                continue;
            };
            match outcome {
                Ok(output) if output.has_summary() => {
                    tracing::debug!(task = %id, "task completed");
                    record.complete(output.normalized());
                }
                Ok(_) => {
                    tracing::warn!(task = %id, "executor returned an output without a summary");
                    record.fail(format!("Task \"{id}\" returned an output without a summary"));
                }
                Err(e) => {
                    tracing::warn!(task = %id, error = %e, "task failed");
                    record.fail(e.to_string());
                }
            }
            // Failed and completed tasks alike carry an end timestamp.
            record.finish();
        }
    }

    /// Block every pending task that has a failed or blocked dependency.
    ///
    /// Returns `true` if at least one task changed state.
    fn block_stalled(&mut self) -> bool {
        let mut to_block = Vec::new();
        for record in self.tasks.values() {
            if record.status != TaskStatus::Pending {
                continue;
            }
            let blocker = record.dependencies.iter().find(|dep| {
                matches!(
                    self.tasks.get(*dep).map(|d| d.status),
                    Some(TaskStatus::Failed | TaskStatus::Blocked)
                )
            });
            if let Some(dep) = blocker {
                to_block.push((record.id.clone(), dep.clone()));
            }
        }
        for (id, dep) in &to_block {
            tracing::info!(task = %id, dependency = %dep, "blocking task");
            if let Some(record) = self.tasks.get_mut(id) {
                record.block(dep);
            }
        }
        !to_block.is_empty()
    }

    /// Fail every still-pending task with the given reason (cancellation).
    fn fail_pending(&mut self, reason: &str) {
        for record in self.tasks.values_mut() {
            if record.status == TaskStatus::Pending {
                record.fail(reason);
                record.finish();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::task::{TaskOutput, TaskSnapshot};

    fn engine() -> Architect {
        Architect::new(Directive::parse("# Test Directive\n\n## Output & Handoff\n\nShip it.\n"))
    }

    fn ok_executor(summary: &str) -> impl TaskExecutor + 'static {
        let summary = summary.to_string();
        move || {
            let summary = summary.clone();
            async move { anyhow::Ok(TaskOutput::new(summary)) }
        }
    }

    fn failing_executor(message: &str) -> impl TaskExecutor + 'static {
        let message = message.to_string();
        move || {
            let message = message.clone();
            async move { Err::<TaskOutput, anyhow::Error>(anyhow::anyhow!(message)) }
        }
    }

    fn logging_executor(
        log: Arc<Mutex<Vec<String>>>,
        id: &str,
        files: Vec<&str>,
    ) -> impl TaskExecutor + 'static {
        let id = id.to_string();
        let files: Vec<String> = files.into_iter().map(String::from).collect();
        move || {
            let log = Arc::clone(&log);
            let id = id.clone();
            let files = files.clone();
            async move {
                // Yield once so wave-mates interleave.
                tokio::time::sleep(Duration::from_millis(2)).await;
                log.lock().unwrap().push(id.clone());
                anyhow::Ok(TaskOutput::new(format!("finished {id}")).with_files(files))
            }
        }
    }

    fn find<'a>(handoff: &'a Handoff, id: &str) -> &'a TaskSnapshot {
        handoff.tasks.iter().find(|t| t.id == id).unwrap()
    }

    #[tokio::test]
    async fn test_linear_chain_runs_in_dependency_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut architect = engine();
        architect
            .register_task(
                TaskConfig::new("a", "A", "first"),
                logging_executor(Arc::clone(&log), "a", vec![]),
            )
            .unwrap();
        architect
            .register_task(
                TaskConfig::new("b", "B", "second").depends_on("a"),
                logging_executor(Arc::clone(&log), "b", vec![]),
            )
            .unwrap();
        architect
            .register_task(
                TaskConfig::new("c", "C", "third").depends_on("b"),
                logging_executor(Arc::clone(&log), "c", vec![]),
            )
            .unwrap();

        let handoff = architect.execute("feature").await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert!(handoff
            .tasks
            .iter()
            .all(|t| t.status == TaskStatus::Completed));
    }

    #[tokio::test]
    async fn test_every_task_reaches_a_terminal_state() {
        let mut architect = engine();
        architect
            .register_task(TaskConfig::new("ok", "Ok", "works"), ok_executor("done"))
            .unwrap();
        architect
            .register_task(
                TaskConfig::new("boom", "Boom", "explodes"),
                failing_executor("executor exploded"),
            )
            .unwrap();
        architect
            .register_task(
                TaskConfig::new("after", "After", "waits").depends_on("boom"),
                ok_executor("never runs"),
            )
            .unwrap();

        let handoff = architect.execute("feature").await.unwrap();
        assert!(handoff.tasks.iter().all(|t| t.status.is_terminal()));
        assert!(handoff
            .tasks
            .iter()
            .all(|t| t.started_at.is_some() || t.status == TaskStatus::Blocked));
        assert!(handoff.tasks.iter().all(|t| t.finished_at.is_some()));
    }

    #[tokio::test]
    async fn test_failure_blocks_dependents_and_names_the_blocker() {
        let mut architect = engine();
        architect
            .register_task(
                TaskConfig::new("base", "Base", "fails"),
                failing_executor("disk on fire"),
            )
            .unwrap();
        architect
            .register_task(
                TaskConfig::new("mid", "Mid", "depends").depends_on("base"),
                ok_executor("unused"),
            )
            .unwrap();
        architect
            .register_task(
                TaskConfig::new("top", "Top", "transitively depends").depends_on("mid"),
                ok_executor("unused"),
            )
            .unwrap();
        architect
            .register_task(
                TaskConfig::new("solo", "Solo", "independent"),
                ok_executor("fine"),
            )
            .unwrap();

        let handoff = architect.execute("feature").await.unwrap();
        assert_eq!(find(&handoff, "base").status, TaskStatus::Failed);
        assert_eq!(find(&handoff, "base").error.as_deref(), Some("disk on fire"));

        let mid = find(&handoff, "mid");
        assert_eq!(mid.status, TaskStatus::Blocked);
        assert!(mid.error.as_deref().unwrap().contains("\"base\""));

        let top = find(&handoff, "top");
        assert_eq!(top.status, TaskStatus::Blocked);
        assert!(top.error.as_deref().unwrap().contains("\"mid\""));

        assert_eq!(find(&handoff, "solo").status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn test_empty_summary_fails_the_task_by_contract() {
        let mut architect = engine();
        architect
            .register_task(TaskConfig::new("hollow", "Hollow", "says nothing"), || async {
                anyhow::Ok(TaskOutput::new("  "))
            })
            .unwrap();

        let handoff = architect.execute("feature").await.unwrap();
        let task = find(&handoff, "hollow");
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.error.as_deref().unwrap().contains("\"hollow\""));
        assert!(task.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_files_touched_union_preserves_first_appearance() {
        let mut architect = engine();
        architect
            .register_task(
                TaskConfig::new("a", "A", "writes"),
                || async {
                    anyhow::Ok(TaskOutput::new("a done").with_files([
                        "src/core.rs",
                        "src/api.rs",
                        "src/core.rs",
                    ]))
                },
            )
            .unwrap();
        architect
            .register_task(
                TaskConfig::new("b", "B", "writes more").depends_on("a"),
                || async {
                    anyhow::Ok(TaskOutput::new("b done").with_files(["src/api.rs", "src/tests.rs"]))
                },
            )
            .unwrap();

        let handoff = architect.execute("feature").await.unwrap();
        assert_eq!(
            handoff.files_touched,
            vec!["src/core.rs", "src/api.rs", "src/tests.rs"]
        );
        // Per-task lists are deduplicated too.
        assert_eq!(
            find(&handoff, "a").output.as_ref().unwrap().files_touched,
            vec!["src/core.rs", "src/api.rs"]
        );
    }

    #[tokio::test]
    async fn test_diamond_waves_respect_dependencies() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut architect = engine();
        architect
            .register_task(
                TaskConfig::new("root", "Root", "first"),
                logging_executor(Arc::clone(&log), "root", vec![]),
            )
            .unwrap();
        architect
            .register_task(
                TaskConfig::new("left", "Left", "branch").depends_on("root"),
                logging_executor(Arc::clone(&log), "left", vec![]),
            )
            .unwrap();
        architect
            .register_task(
                TaskConfig::new("right", "Right", "branch").depends_on("root"),
                logging_executor(Arc::clone(&log), "right", vec![]),
            )
            .unwrap();
        architect
            .register_task(
                TaskConfig::new("join", "Join", "last").with_dependencies(["left", "right"]),
                logging_executor(Arc::clone(&log), "join", vec![]),
            )
            .unwrap();

        architect.execute("feature").await.unwrap();
        let order = log.lock().unwrap().clone();
        let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
        assert!(pos("root") < pos("left"));
        assert!(pos("root") < pos("right"));
        assert!(pos("left") < pos("join"));
        assert!(pos("right") < pos("join"));
    }

    #[tokio::test]
    async fn test_cycle_is_detected_not_hung() {
        let mut architect = engine();
        architect
            .register_task(
                TaskConfig::new("a", "A", "waits for b").depends_on("b"),
                ok_executor("never"),
            )
            .unwrap();
        architect
            .register_task(
                TaskConfig::new("b", "B", "waits for a").depends_on("a"),
                ok_executor("never"),
            )
            .unwrap();

        let err = architect.execute("feature").await.unwrap_err();
        match err {
            ArchitectError::CircularDependency(ids) => {
                assert!(ids.contains('a') && ids.contains('b'));
            }
            other => panic!("expected CircularDependency, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_dependency_is_fatal_before_dispatch() {
        let mut architect = engine();
        architect
            .register_task(
                TaskConfig::new("a", "A", "depends on ghost").depends_on("ghost"),
                ok_executor("never"),
            )
            .unwrap();

        let err = architect.execute("feature").await.unwrap_err();
        match err {
            ArchitectError::UnknownDependency { task, dependency } => {
                assert_eq!(task, "a");
                assert_eq!(dependency, "ghost");
            }
            other => panic!("expected UnknownDependency, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_registry_is_an_error() {
        let mut architect = engine();
        assert!(matches!(
            architect.execute("feature").await,
            Err(ArchitectError::NoTasks)
        ));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut architect = engine();
        architect
            .register_task(TaskConfig::new("a", "A", "one"), ok_executor("x"))
            .unwrap();
        let err = architect
            .register_task(TaskConfig::new("a", "A again", "two"), ok_executor("y"))
            .unwrap_err();
        assert!(matches!(err, ArchitectError::DuplicateTask(id) if id == "a"));
    }

    #[test]
    fn test_self_dependency_is_rejected_at_registration() {
        let mut architect = engine();
        let err = architect
            .register_task(
                TaskConfig::new("loopy", "Loopy", "self-referential").depends_on("loopy"),
                ok_executor("x"),
            )
            .unwrap_err();
        assert!(matches!(err, ArchitectError::SelfDependency(id) if id == "loopy"));
    }

    #[tokio::test]
    async fn test_cancellation_fails_undispatched_tasks() {
        let token = CancellationToken::new();
        token.cancel();

        let mut architect = engine();
        architect
            .register_task(TaskConfig::new("a", "A", "would run"), ok_executor("x"))
            .unwrap();
        architect
            .register_task(
                TaskConfig::new("b", "B", "would follow").depends_on("a"),
                ok_executor("y"),
            )
            .unwrap();

        let handoff = architect
            .execute_with(
                "feature",
                ExecuteOptions {
                    cancel_token: Some(token),
                },
            )
            .await
            .unwrap();
        for task in &handoff.tasks {
            assert_eq!(task.status, TaskStatus::Failed);
            assert!(task.error.as_deref().unwrap().contains("cancelled"));
        }
    }

    #[test]
    fn test_registration_defers_dependency_resolution() {
        // Registering out of order is fine; only execute() validates ids.
        tokio_test::block_on(async {
            let mut architect = engine();
            architect
                .register_task(
                    TaskConfig::new("late", "Late", "depends forward").depends_on("early"),
                    ok_executor("late done"),
                )
                .unwrap();
            architect
                .register_task(TaskConfig::new("early", "Early", "registered last"), ok_executor("early done"))
                .unwrap();
            let handoff = architect.execute("feature").await.unwrap();
            assert!(handoff.tasks.iter().all(|t| t.status == TaskStatus::Completed));
        });
    }
}
