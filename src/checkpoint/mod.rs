// src/checkpoint/mod.rs

//! Durable session checkpoints.
//!
//! - [`snapshot`] defines the versioned, checksummed on-disk format.
//! - [`store`] writes snapshots atomically (temp file + rename) and reads,
//!   lists and discards them.
//! - [`retry`] retries failed writes with exponential backoff.
//! - [`resume`] restores a session and settles the job that was running
//!   when it was interrupted.

pub mod resume;
pub mod retry;
pub mod snapshot;
pub mod store;

use thiserror::Error;

pub use resume::{ResolutionSource, ResultOverride, ResumeResolution, Resumed, resume};
pub use retry::{BackoffPolicy, CheckpointWarning, RetryPolicy, save_with_retry};
pub use snapshot::{CHECKPOINT_FORMAT, CHECKPOINT_VERSION, Snapshot};
pub use store::{CheckpointStore, SessionListing, SessionSummary};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckpointError {
    #[error("no checkpoint found for session {0}")]
    NotFound(String),

    #[error("checkpoint of session {session_id} is corrupt: {reason}")]
    Corrupt { session_id: String, reason: String },

    #[error(
        "checkpoint of session {session_id} has format {format:?} version {version}, \
         expected {expected_format:?} version {expected_version}",
        expected_format = CHECKPOINT_FORMAT,
        expected_version = CHECKPOINT_VERSION
    )]
    Incompatible {
        session_id: String,
        format: String,
        version: u64,
    },

    #[error("checkpoint I/O failed for session {session_id}: {message}")]
    Io { session_id: String, message: String },
}

impl CheckpointError {
    pub(crate) fn corrupt(session_id: &str, reason: impl ToString) -> Self {
        CheckpointError::Corrupt {
            session_id: session_id.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn io(session_id: &str, err: anyhow::Error) -> Self {
        CheckpointError::Io {
            session_id: session_id.to_string(),
            message: format!("{err:#}"),
        }
    }
}
