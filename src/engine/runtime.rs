// src/engine/runtime.rs

use std::collections::BTreeMap;
use std::fmt;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

use crate::engine::DriverEvent;
use crate::engine::core::SessionManager;
use crate::engine::runner::{JobReport, JobRunner};
use crate::errors::Result;
use crate::session::{JobResult, Readiness, SessionError};
use crate::types::{JobId, Outcome};

/// What one pass of the run loop did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Jobs handed to the runner, in order.
    pub executed: Vec<JobId>,
    /// Jobs skipped because they could not start, or because of an abort.
    pub skipped: Vec<JobId>,
    pub aborted: bool,
    pub outcomes: BTreeMap<Outcome, usize>,
}

/// Drives a session to completion, one job at a time.
///
/// All session semantics live in [`SessionManager`]; this loop only awaits
/// the runner and watches for [`DriverEvent`]s between jobs.
pub struct Runtime<R: JobRunner> {
    manager: SessionManager,
    runner: R,
    events: mpsc::Receiver<DriverEvent>,
}

impl<R: JobRunner> fmt::Debug for Runtime<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}

impl<R: JobRunner> Runtime<R> {
    pub fn new(manager: SessionManager, runner: R, events: mpsc::Receiver<DriverEvent>) -> Self {
        Self {
            manager,
            runner,
            events,
        }
    }

    fn abort_requested(&mut self) -> bool {
        match self.events.try_recv() {
            Ok(DriverEvent::AbortRequested) => true,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => false,
        }
    }

    /// Main loop.
    ///
    /// - Picks the next job of the run list without a result.
    /// - Runs it if it can start, otherwise records `skip` with the reasons.
    /// - Stops when nothing is left or an abort was requested.
    ///
    /// Returns the manager so the caller can inspect or close the session.
    pub async fn run(mut self) -> Result<(SessionManager, RunSummary)> {
        info!(session = %self.manager.session_id(), "run loop started");
        let mut summary = RunSummary::default();

        loop {
            if self.abort_requested() {
                info!("abort requested; skipping remaining jobs");
                let skipped = self.manager.abort("session aborted by the operator");
                summary.skipped.extend(skipped);
                summary.aborted = true;
                break;
            }

            let Some(job_id) = self.manager.state().next_job().cloned() else {
                info!("no jobs left to run");
                break;
            };

            let readiness = self
                .manager
                .state()
                .readiness(&job_id)
                .unwrap_or(Readiness::Undesired);

            if readiness != Readiness::CanStart {
                let reasons = self
                    .manager
                    .state()
                    .job_state(&job_id)
                    .map(|s| {
                        s.inhibitors()
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join("; ")
                    })
                    .unwrap_or_default();
                debug!(job = %job_id, %readiness, %reasons, "job cannot start; skipping");

                let report = JobReport::new(
                    JobResult::new(Outcome::Skip)
                        .with_comments(format!("job cannot be started: {reasons}")),
                );
                self.manager.update_job_result(&job_id, report)?;
                summary.skipped.push(job_id);
                continue;
            }

            self.manager.start_job(&job_id)?;

            let unit = self
                .manager
                .state()
                .graph()
                .get(&job_id)
                .cloned()
                .ok_or_else(|| SessionError::UnknownJob(job_id.clone()))?;

            let report = match self.runner.run_job(&unit).await {
                Ok(report) => report,
                Err(err) => {
                    warn!(job = %job_id, error = %err, "job runner failed");
                    JobReport::new(
                        JobResult::new(Outcome::Crash)
                            .with_comments(format!("job runner failed: {err}")),
                    )
                }
            };

            self.manager.update_job_result(&job_id, report)?;
            summary.executed.push(job_id);
        }

        summary.outcomes = self.manager.state().outcome_stats();
        info!(
            executed = summary.executed.len(),
            skipped = summary.skipped.len(),
            aborted = summary.aborted,
            "run loop finished"
        );
        Ok((self.manager, summary))
    }
}
