// src/session/mod.rs

//! Session state machine.
//!
//! - [`machine`] owns the unit graph, the plan and every job's state.
//! - [`readiness`] derives inhibitors and readiness from scratch.
//! - [`state`] holds per-job results and status.
//! - [`step`] defines what the machine returns from its operations.
//! - [`metadata`] describes the session itself.

pub mod machine;
pub mod metadata;
pub mod readiness;
pub mod state;
pub mod step;

use thiserror::Error;

use crate::types::{JobId, Outcome};

pub use machine::{DurationEstimate, SessionState};
pub use metadata::{FLAG_BOOTSTRAPPING, FLAG_INCOMPLETE, FLAG_SUBMITTED, SessionMetadata};
pub use readiness::{InhibitionCause, Inhibitor, Readiness, compute_inhibitors};
pub use state::{JobResult, JobState, JobStatus};
pub use step::{PlanUpdate, ReadinessChange};

/// Misuse of the session API by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unknown job: {0}")]
    UnknownJob(JobId),

    #[error("job {0} is not in the run list")]
    NotInRunList(JobId),

    #[error("job {id} cannot start: {reasons}")]
    NotRunnable { id: JobId, reasons: String },

    #[error("cannot start {requested}: job {running} is still running")]
    AlreadyRunning { running: JobId, requested: JobId },

    #[error("job {id} already has outcome {recorded}; refusing to record {requested}")]
    OutcomeConflict {
        id: JobId,
        recorded: Outcome,
        requested: Outcome,
    },

    #[error("job {0} is not a local job and cannot generate units")]
    NotLocal(JobId),
}
