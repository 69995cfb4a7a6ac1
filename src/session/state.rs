// src/session/state.rs

//! Per-job state tracked by the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::readiness::{Inhibitor, Readiness};
use crate::types::Outcome;

/// Recorded terminal result of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_code: Option<i32>,
    pub recorded_at: DateTime<Utc>,
}

impl JobResult {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            comments: None,
            return_code: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    pub fn with_return_code(mut self, code: i32) -> Self {
        self.return_code = Some(code);
        self
    }
}

/// Coarse lifecycle of a job within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    /// Not runnable yet (or not desired).
    Unknown,
    Runnable,
    Running,
    Passed,
    Failed,
    Skipped,
    Crashed,
}

/// State of one job: its result (if any), whether it is running, and the
/// inhibitors computed by the last readiness pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobState {
    pub(crate) result: Option<JobResult>,
    pub(crate) running: bool,
    pub(crate) inhibitors: Vec<Inhibitor>,
}

impl JobState {
    pub fn result(&self) -> Option<&JobResult> {
        self.result.as_ref()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.result.as_ref().map(|r| r.outcome)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn inhibitors(&self) -> &[Inhibitor] {
        &self.inhibitors
    }

    pub fn readiness(&self) -> Readiness {
        Readiness::from_inhibitors(&self.inhibitors)
    }

    pub fn can_start(&self) -> bool {
        self.inhibitors.is_empty()
    }

    pub fn status(&self) -> JobStatus {
        match self.outcome() {
            Some(Outcome::Pass) => JobStatus::Passed,
            Some(Outcome::Fail) => JobStatus::Failed,
            Some(Outcome::Skip) => JobStatus::Skipped,
            Some(Outcome::Crash) => JobStatus::Crashed,
            None if self.running => JobStatus::Running,
            None if self.can_start() => JobStatus::Runnable,
            None => JobStatus::Unknown,
        }
    }
}
