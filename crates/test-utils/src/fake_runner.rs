use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use sessiondag::engine::{DriverEvent, JobReport, JobRunner};
use sessiondag::errors::Result;
use sessiondag::types::Outcome;
use sessiondag::unit::Unit;

/// A fake runner that:
/// - records which jobs were "run"
/// - answers with the scripted report for a job, or `pass` by default
/// - optionally requests an abort right after a given job.
pub struct FakeRunner {
    executed: Arc<Mutex<Vec<String>>>,
    script: HashMap<String, JobReport>,
    broken: Vec<String>,
    abort_after: Option<(String, mpsc::Sender<DriverEvent>)>,
}

impl FakeRunner {
    pub fn new(executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            executed,
            script: HashMap::new(),
            broken: Vec::new(),
            abort_after: None,
        }
    }

    /// Report `report` when `job` runs.
    pub fn script(mut self, job: &str, report: JobReport) -> Self {
        self.script.insert(job.to_string(), report);
        self
    }

    pub fn outcome(self, job: &str, outcome: Outcome) -> Self {
        self.script(job, JobReport::outcome(outcome))
    }

    /// Make the runner itself fail on `job`.
    pub fn broken(mut self, job: &str) -> Self {
        self.broken.push(job.to_string());
        self
    }

    /// Send `AbortRequested` once `job` has run.
    pub fn abort_after(mut self, job: &str, tx: mpsc::Sender<DriverEvent>) -> Self {
        self.abort_after = Some((job.to_string(), tx));
        self
    }
}

impl JobRunner for FakeRunner {
    fn run_job<'a>(
        &'a mut self,
        job: &'a Unit,
    ) -> Pin<Box<dyn Future<Output = Result<JobReport>> + Send + 'a>> {
        Box::pin(async move {
            {
                let mut guard = self.executed.lock().unwrap();
                guard.push(job.id.clone());
            }

            if let Some((after, tx)) = &self.abort_after {
                if *after == job.id {
                    tx.send(DriverEvent::AbortRequested)
                        .await
                        .map_err(anyhow::Error::from)?;
                }
            }

            if self.broken.contains(&job.id) {
                return Err(anyhow::anyhow!("runner exploded on {}", job.id).into());
            }

            Ok(self
                .script
                .get(&job.id)
                .cloned()
                .unwrap_or_else(|| JobReport::outcome(Outcome::Pass)))
        })
    }
}
