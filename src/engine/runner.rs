// src/engine/runner.rs

//! Pluggable job runner abstraction.
//!
//! The run loop hands one [`Unit`] at a time to a `JobRunner` and waits for
//! its [`JobReport`]. How a job is executed (processes, prompts, remote
//! agents...) is entirely up to the implementation; tests use a scripted
//! runner that never spawns anything.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::resource::ResourceRecord;
use crate::session::JobResult;
use crate::types::Outcome;
use crate::unit::Unit;

/// Everything a finished job reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub result: JobResult,
    /// Records emitted by a resource job. Ignored for other plugins.
    pub resource_records: Vec<ResourceRecord>,
    /// Units generated by a local job. Ignored for other plugins.
    pub generated_units: Vec<Unit>,
}

impl JobReport {
    pub fn new(result: JobResult) -> Self {
        Self {
            result,
            resource_records: Vec::new(),
            generated_units: Vec::new(),
        }
    }

    pub fn outcome(outcome: Outcome) -> Self {
        Self::new(JobResult::new(outcome))
    }

    pub fn with_records(mut self, records: Vec<ResourceRecord>) -> Self {
        self.resource_records = records;
        self
    }

    pub fn with_units(mut self, units: Vec<Unit>) -> Self {
        self.generated_units = units;
        self
    }
}

/// Trait abstracting how a single job is executed.
pub trait JobRunner: Send {
    /// Run `job` to completion.
    ///
    /// An `Err` means the runner itself broke down; the run loop records the
    /// job as crashed and carries on.
    fn run_job<'a>(
        &'a mut self,
        job: &'a Unit,
    ) -> Pin<Box<dyn Future<Output = Result<JobReport>> + Send + 'a>>;
}
