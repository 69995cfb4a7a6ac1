// src/checkpoint/resume.rs

//! Resuming an interrupted session.
//!
//! If a job was running when the session stopped, it gets an outcome
//! before anything else happens, in this order of precedence:
//! 1. the override file `<session>/share/__result`, if it parses
//! 2. `pass` for jobs flagged `noreturn` (they were expected to reboot or
//!    power off the machine)
//! 3. `crash` otherwise
//!
//! The resolved session is checkpointed right away. The override file is
//! removed only once that checkpoint is on disk; if it could not be written,
//! the file stays so the next resume applies the same override again.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::checkpoint::CheckpointError;
use crate::checkpoint::retry::{CheckpointWarning, RetryPolicy, save_with_retry};
use crate::checkpoint::snapshot::Snapshot;
use crate::checkpoint::store::CheckpointStore;
use crate::session::{JobResult, ReadinessChange, SessionState};
use crate::types::{JobId, Outcome};

/// Outcome supplied out-of-band for the job that was running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultOverride {
    pub outcome: Outcome,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionSource {
    Override,
    NoReturn,
    Crash,
}

/// How the interrupted job was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeResolution {
    pub job: JobId,
    pub outcome: Outcome,
    pub source: ResolutionSource,
    pub change: ReadinessChange,
}

#[derive(Debug)]
pub struct Resumed {
    pub state: SessionState,
    pub resolution: Option<ResumeResolution>,
    /// Set when the post-resume checkpoint could not be written.
    pub warning: Option<CheckpointWarning>,
}

fn default_result(state: &SessionState, job: &str) -> (JobResult, ResolutionSource) {
    let noreturn = state.graph().get(job).is_some_and(|u| u.is_noreturn());
    if noreturn {
        (
            JobResult::new(Outcome::Pass)
                .with_comments("noreturn job interrupted the session; presumed passed"),
            ResolutionSource::NoReturn,
        )
    } else {
        (
            JobResult::new(Outcome::Crash)
                .with_comments("session was interrupted while this job was running"),
            ResolutionSource::Crash,
        )
    }
}

/// Load `session_id` and settle its interrupted job, if any.
pub fn resume(
    store: &CheckpointStore,
    session_id: &str,
    policy: &RetryPolicy,
) -> Result<Resumed, CheckpointError> {
    let snapshot = store.load(session_id)?;
    let mut state = snapshot.restore();

    let override_result = match store.read_override(session_id) {
        Ok(found) => found,
        Err(err) => {
            warn!(session = %session_id, error = %err, "ignoring unreadable override file");
            None
        }
    };

    let Some(job) = state.running_job().cloned() else {
        if override_result.is_some() {
            warn!(session = %session_id, "override file present but no job was running");
            store.remove_override(session_id)?;
        }
        info!(session = %session_id, "session resumed");
        return Ok(Resumed {
            state,
            resolution: None,
            warning: None,
        });
    };

    let (result, source) = match override_result {
        Some(ov) => {
            let comments = ov
                .comments
                .unwrap_or_else(|| "outcome supplied by override file".to_string());
            (
                JobResult::new(ov.outcome).with_comments(comments),
                ResolutionSource::Override,
            )
        }
        None => default_result(&state, &job),
    };
    let outcome = result.outcome;

    let change = state
        .update_job_result(&job, result)
        .map_err(|e| CheckpointError::corrupt(session_id, e))?;

    info!(
        session = %session_id,
        %job,
        %outcome,
        ?source,
        "interrupted job settled on resume"
    );

    let warning = match save_with_retry(store, &Snapshot::capture(&state), policy) {
        Ok(_) => {
            store.remove_override(session_id)?;
            None
        }
        Err(warning) => {
            if source == ResolutionSource::Override {
                warn!(session = %session_id, "checkpoint not written; keeping override file");
            }
            Some(warning)
        }
    };

    Ok(Resumed {
        state,
        resolution: Some(ResumeResolution {
            job,
            outcome,
            source,
            change,
        }),
        warning,
    })
}
