//! # archon
//!
//! Task-graph execution engine with a downstream verification pipeline.
//!
//! This library provides:
//! - A dependency-aware scheduler ("Architect") over caller-supplied async
//!   task executors
//! - A verification planner/aggregator ("Quasar") that derives one check per
//!   executed task and rolls tester verdicts into a single verdict
//! - Deterministic markdown renderers for the two documents a run produces:
//!   the development handoff and the global quality report
//!
//! ## Architecture
//!
//! ```text
//! directive markdown ──► Directive ─────────────┐
//!                                               ▼
//! feature request ─────► Architect ──waves──► Handoff
//!   + registered tasks   (task graph)           │
//!                                               ▼
//! caller testers ──────► Quasar ──────────► QualityReport
//!                        (verification)
//! ```
//!
//! ## Flow
//! 1. Parse the directive once; it is read-only for the rest of the run
//! 2. Register tasks with ids, missions, dependencies, and executors
//! 3. `Architect::execute` runs the graph in concurrent waves and hands off
//! 4. `Quasar::execute_tests` verifies each task's deliverables in order
//!
//! The engine performs none of the actual work. Executors and testers are
//! opaque async strategies; the core only sequences, tracks, and reports.
//!
//! ## Modules
//! - `directive`: markdown section parsing for verbatim reuse in reports
//! - `task`: task definitions, lifecycle state, executor outputs
//! - `architect`: the wave scheduler and handoff bundle
//! - `quasar`: the verification planner, aggregator, and quality report

pub mod architect;
pub mod directive;
pub mod quasar;
pub mod task;

pub use architect::{Architect, ArchitectError, ExecuteOptions, Handoff, TaskExecutor};
pub use directive::{Directive, Section};
pub use quasar::{
    AggregatedReport, OverallStatus, QualityReport, Quasar, QuasarError, Tester, TesterReport,
    TesterStatus, VerificationItem,
};
pub use task::{TaskConfig, TaskOutput, TaskSnapshot, TaskStatus};
