//! archon demo - runs a scripted feature request end to end.
//!
//! Registers three dependent tasks with canned executors, executes the graph,
//! then verifies the handoff with a canned tester. Prints both rendered
//! documents to stdout. Useful for eyeballing report layout changes.

use archon::{
    Architect, Directive, Quasar, TaskConfig, TaskOutput, TesterReport, VerificationItem,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DIRECTIVE: &str = r#"# Platform Team Directive

## Core Workflow

Plan the work, execute it under dependency order, then verify every
deliverable before declaring success.

## Output & Handoff

Every run ends with a handoff document listing missions, results, and the
files that were modified. Verification reads that document, nothing else.
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "archon=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let directive = Directive::parse(DIRECTIVE);

    let mut architect = Architect::new(directive.clone());
    architect.register_task(
        TaskConfig::new("scaffold", "Scaffold the module", "Create the crate skeleton and wiring"),
        || async {
            anyhow::Ok(
                TaskOutput::new("Created module skeleton with public API stubs")
                    .with_files(["src/limiter/mod.rs", "src/lib.rs"]),
            )
        },
    )?;
    architect.register_task(
        TaskConfig::new("implement", "Implement rate limiting", "Token bucket with per-key state")
            .depends_on("scaffold"),
        || async {
            anyhow::Ok(
                TaskOutput::new("Implemented token-bucket limiter")
                    .with_file("src/limiter/bucket.rs")
                    .with_artifact("bench", "baseline throughput numbers")
                    .with_notes("refill is lazy, no background task"),
            )
        },
    )?;
    architect.register_task(
        TaskConfig::new("document", "Document the feature", "Usage docs and config reference")
            .depends_on("implement"),
        || async {
            anyhow::Ok(TaskOutput::new("Wrote usage docs").with_file("docs/rate-limiting.md"))
        },
    )?;

    let handoff = architect
        .execute("Add a rate limiter to the API gateway")
        .await?;
    println!("{}", handoff.document);

    let quasar = Quasar::new(directive, handoff);
    let report = quasar
        .execute_tests(&|item: VerificationItem| async move {
            anyhow::Ok(TesterReport::pass(format!(
                "Reviewed deliverables for task \"{}\"",
                item.target_task_id
            )))
        })
        .await?;
    println!("{}", report.markdown);

    Ok(())
}
