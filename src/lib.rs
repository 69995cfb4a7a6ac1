// src/lib.rs

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod resource;
pub mod session;
pub mod solver;
pub mod types;
pub mod unit;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::checkpoint::CheckpointStore;
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::PlanFile;
use crate::config::selection::Selection;
use crate::session::{SessionMetadata, SessionState};
use crate::solver::ProblemReport;
use crate::types::JobId;

/// High-level entry point used by `main.rs`.
///
/// Job execution is left to embedders of the library (see
/// [`engine::JobRunner`]); the binary plans sessions and manages the ones
/// already stored:
/// - `--list-sessions`, `--inspect`, `--discard` work on the checkpoint store
/// - `--dry-run` solves and prints the plan
///
/// Arguments without any of these are rejected.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let plan = load_and_validate(&config_path)
        .with_context(|| format!("loading plan file {config_path:?}"))?;

    let store = CheckpointStore::on_disk(&plan.session.root);

    if args.list_sessions {
        return list_sessions(&store);
    }
    if let Some(id) = args.inspect.as_deref() {
        return inspect_session(&store, id);
    }
    if let Some(id) = args.discard.as_deref() {
        store.discard(id)?;
        println!("discarded session {id}");
        return Ok(());
    }
    if !args.dry_run {
        anyhow::bail!("no action given: pass --dry-run, --list-sessions, --inspect or --discard");
    }

    print_plan(&plan, &args.jobs)
}

/// Solve the plan without creating a session on disk.
fn plan_session(plan: &PlanFile, explicit_jobs: &[String]) -> Result<SessionState> {
    let selection = Selection::compile(&plan.selection)?;
    let registry = plan.registry();

    let desired: Vec<JobId> = if explicit_jobs.is_empty() {
        selection.select(registry.units())
    } else {
        explicit_jobs.to_vec()
    };
    info!(desired = desired.len(), "desired jobs selected");

    let mut state =
        SessionState::from_registry(registry, SessionMetadata::new(plan.session.title.clone()));
    state.update_mandatory_job_list(selection.mandatory());
    state.update_desired_job_list(&desired);
    Ok(state)
}

/// Dry-run output: the run list, the problem report and the estimate.
fn print_plan(plan: &PlanFile, explicit_jobs: &[String]) -> Result<()> {
    let state = plan_session(plan, explicit_jobs)?;

    println!("sessiondag dry-run");
    if let Some(title) = plan.session.title.as_deref() {
        println!("  session.title = {title}");
    }
    println!("  session.root = {}", plan.session.root.display());
    println!();

    println!("run list ({}):", state.run_list().len());
    for (n, id) in state.run_list().iter().enumerate() {
        let Some(unit) = state.graph().get(id) else {
            continue;
        };
        let readiness = state
            .readiness(id)
            .map(|r| r.to_string())
            .unwrap_or_default();
        println!("  {:>3}. {id} [{}] {readiness}", n + 1, unit.plugin);
        if let Some(job) = state.job_state(id) {
            for inhibitor in job.inhibitors() {
                println!("        {inhibitor}");
            }
        }
    }
    println!();

    let problems = state.problems();
    println!("{}", ProblemReport(&problems));

    let estimate = state.estimated_duration();
    let fmt_secs = |secs: Option<f64>| match secs {
        Some(s) => format!("{s:.0}s"),
        None => "unknown".to_string(),
    };
    println!(
        "estimated duration: automated {}, manual {}",
        fmt_secs(estimate.automated),
        fmt_secs(estimate.manual)
    );

    debug!("dry-run complete (no execution)");
    Ok(())
}

fn list_sessions(store: &CheckpointStore) -> Result<()> {
    let listings = store.list()?;
    if listings.is_empty() {
        println!("no sessions under {}", store.root().display());
        return Ok(());
    }

    for listing in listings {
        match listing.summary {
            Ok(summary) => {
                let flags: Vec<&str> = summary.flags.iter().map(String::as_str).collect();
                println!(
                    "{}  {}  {}/{} done  [{}]  {}",
                    summary.id,
                    summary.saved_at.format("%Y-%m-%d %H:%M:%S"),
                    summary.jobs_done,
                    summary.jobs_total,
                    flags.join(","),
                    summary.title.as_deref().unwrap_or("")
                );
            }
            Err(err) => println!("{}  unreadable: {err}", listing.id),
        }
    }
    Ok(())
}

fn inspect_session(store: &CheckpointStore, id: &str) -> Result<()> {
    let snapshot = store.load(id)?;
    let saved_at = snapshot.saved_at;
    let state = snapshot.restore();

    println!("session {}", state.id());
    if let Some(title) = state.metadata().title.as_deref() {
        println!("  title: {title}");
    }
    println!("  saved at: {}", saved_at.to_rfc3339());
    if let Some(running) = state.running_job() {
        println!("  interrupted while running: {running}");
    }
    println!();

    for id in state.run_list() {
        let Some(job) = state.job_state(id) else {
            continue;
        };
        let outcome = job
            .outcome()
            .map(|o| o.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {id}: {outcome} ({:?})", job.status());
        if let Some(comments) = job.result().and_then(|r| r.comments.as_deref()) {
            println!("      {comments}");
        }
    }

    let stats = state.outcome_stats();
    if !stats.is_empty() {
        println!();
        for (outcome, count) in stats {
            println!("  {outcome}: {count}");
        }
    }
    Ok(())
}
