// src/checkpoint/snapshot.rs

//! Checkpoint file format.
//!
//! ```json
//! {
//!   "format": "sessiondag-checkpoint",
//!   "version": 1,
//!   "checksum": "<blake3 of the compact payload JSON>",
//!   "payload": { ...Snapshot... }
//! }
//! ```
//!
//! The format tag and version are checked before anything else, so a file
//! written by a different format revision is reported as incompatible
//! rather than misread.
//!
//! The checksum is recomputed from the parsed payload on load, which relies
//! on serde_json parsing floats back to the exact value written
//! (`float_roundtrip`).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checkpoint::CheckpointError;
use crate::resource::ResourceMap;
use crate::session::{JobResult, SessionMetadata, SessionState};
use crate::solver::DependencyProblem;
use crate::types::JobId;
use crate::unit::Unit;

pub const CHECKPOINT_FORMAT: &str = "sessiondag-checkpoint";
pub const CHECKPOINT_VERSION: u64 = 1;

/// Full state of a session at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub session: SessionMetadata,
    pub saved_at: DateTime<Utc>,
    pub units: Vec<Unit>,
    #[serde(default)]
    pub mandatory: Vec<JobId>,
    pub desired: Vec<JobId>,
    pub run_list: Vec<JobId>,
    pub results: BTreeMap<JobId, JobResult>,
    pub resources: ResourceMap,
    #[serde(default)]
    pub running_job: Option<JobId>,
    /// Problems found while loading units, which the unit list alone
    /// cannot reproduce.
    #[serde(default)]
    pub load_problems: Vec<DependencyProblem>,
}

impl Snapshot {
    pub fn capture(state: &SessionState) -> Self {
        Self {
            session: state.metadata().clone(),
            saved_at: Utc::now(),
            units: state.graph().units().to_vec(),
            mandatory: state.mandatory_job_list().to_vec(),
            desired: state.desired_job_list().to_vec(),
            run_list: state.run_list().to_vec(),
            results: state.results(),
            resources: state.resources().clone(),
            running_job: state.running_job().cloned(),
            load_problems: state.load_problems().to_vec(),
        }
    }

    pub fn restore(self) -> SessionState {
        SessionState::restore(
            self.session,
            self.units,
            self.mandatory,
            self.desired,
            self.run_list,
            self.results,
            self.resources,
            self.running_job,
            self.load_problems,
        )
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    format: String,
    version: u64,
    checksum: String,
    payload: Value,
}

fn checksum(payload: &Value) -> Result<String, serde_json::Error> {
    let compact = serde_json::to_vec(payload)?;
    Ok(blake3::hash(&compact).to_hex().to_string())
}

/// Serialize `snapshot` into checkpoint file bytes.
pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, serde_json::Error> {
    let payload = serde_json::to_value(snapshot)?;
    let envelope = Envelope {
        format: CHECKPOINT_FORMAT.to_string(),
        version: CHECKPOINT_VERSION,
        checksum: checksum(&payload)?,
        payload,
    };
    serde_json::to_vec_pretty(&envelope)
}

/// Parse checkpoint file contents written for `session_id`.
pub fn decode(session_id: &str, text: &str) -> Result<Snapshot, CheckpointError> {
    let raw: Value =
        serde_json::from_str(text).map_err(|e| CheckpointError::corrupt(session_id, e))?;

    let format = raw.get("format").and_then(Value::as_str);
    let version = raw.get("version").and_then(Value::as_u64);
    match (format, version) {
        (Some(CHECKPOINT_FORMAT), Some(CHECKPOINT_VERSION)) => {}
        (Some(format), Some(version)) => {
            return Err(CheckpointError::Incompatible {
                session_id: session_id.to_string(),
                format: format.to_string(),
                version,
            });
        }
        _ => {
            return Err(CheckpointError::corrupt(
                session_id,
                "missing format tag or version",
            ));
        }
    }

    let envelope: Envelope =
        serde_json::from_value(raw).map_err(|e| CheckpointError::corrupt(session_id, e))?;

    let actual = checksum(&envelope.payload).map_err(|e| CheckpointError::corrupt(session_id, e))?;
    if actual != envelope.checksum {
        return Err(CheckpointError::corrupt(
            session_id,
            format!("checksum mismatch (stored {}, computed {actual})", envelope.checksum),
        ));
    }

    let snapshot: Snapshot = serde_json::from_value(envelope.payload)
        .map_err(|e| CheckpointError::corrupt(session_id, e))?;

    if snapshot.session_id() != session_id {
        return Err(CheckpointError::corrupt(
            session_id,
            format!("checkpoint belongs to session {}", snapshot.session_id()),
        ));
    }

    Ok(snapshot)
}
