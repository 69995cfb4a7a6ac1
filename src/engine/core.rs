// src/engine/core.rs

//! Synchronous driver API.
//!
//! `SessionManager` wraps a [`SessionState`] together with the checkpoint
//! store it is persisted to. Every operation that produces a new terminal
//! outcome (or changes the plan) writes a checkpoint before returning, so
//! callers never have to remember to do it.
//!
//! It has no channels and no Tokio types; the async run loop in
//! [`super::runtime`] is a thin shell around it.

use tracing::{info, warn};

use crate::checkpoint::{
    CheckpointError, CheckpointStore, CheckpointWarning, ResumeResolution, RetryPolicy,
    Snapshot, resume, save_with_retry,
};
use crate::engine::runner::JobReport;
use crate::session::{
    FLAG_INCOMPLETE, PlanUpdate, ReadinessChange, SessionError, SessionMetadata, SessionState,
};
use crate::types::{JobId, Plugin};
use crate::unit::UnitRegistry;

/// How to obtain the session when opening it.
#[derive(Debug)]
pub enum OpenMode {
    /// A brand-new session over the units of `registry`.
    Fresh {
        registry: UnitRegistry,
        title: Option<String>,
    },
    /// Load a stored session and settle its interrupted job, if any.
    Resume { session_id: String },
}

/// What recording one job report changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobApplied {
    pub readiness: ReadinessChange,
    /// Set when a local job's generated units changed the plan.
    pub plan: Option<PlanUpdate>,
    pub checkpoint_warning: Option<CheckpointWarning>,
}

#[derive(Debug)]
pub struct SessionManager {
    state: SessionState,
    store: CheckpointStore,
    retry: RetryPolicy,
    warnings: Vec<CheckpointWarning>,
}

impl SessionManager {
    /// Open a session. For a resumed session, also returns how its
    /// interrupted job was settled.
    pub fn open(
        store: CheckpointStore,
        retry: RetryPolicy,
        mode: OpenMode,
    ) -> Result<(Self, Option<ResumeResolution>), CheckpointError> {
        match mode {
            OpenMode::Fresh { registry, title } => {
                let state = SessionState::from_registry(registry, SessionMetadata::new(title));
                let mut manager = Self::with_state(state, store, retry);
                info!(session = %manager.session_id(), "session created");
                manager.checkpoint();
                Ok((manager, None))
            }
            OpenMode::Resume { session_id } => {
                let resumed = resume(&store, &session_id, &retry)?;
                let mut manager = Self::with_state(resumed.state, store, retry);
                manager.warnings.extend(resumed.warning);
                Ok((manager, resumed.resolution))
            }
        }
    }

    /// Wrap an existing state without touching the store.
    pub fn with_state(state: SessionState, store: CheckpointStore, retry: RetryPolicy) -> Self {
        Self {
            state,
            store,
            retry,
            warnings: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session_id(&self) -> &str {
        self.state.id()
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    pub fn run_list(&self) -> &[JobId] {
        self.state.run_list()
    }

    /// Checkpoint warnings accumulated so far.
    pub fn warnings(&self) -> &[CheckpointWarning] {
        &self.warnings
    }

    /// Write a checkpoint now. Failures are kept in [`warnings`](Self::warnings)
    /// and returned.
    pub fn checkpoint(&mut self) -> Option<CheckpointWarning> {
        let snapshot = Snapshot::capture(&self.state);
        match save_with_retry(&self.store, &snapshot, &self.retry) {
            Ok(_) => None,
            Err(warning) => {
                self.warnings.push(warning.clone());
                Some(warning)
            }
        }
    }

    pub fn update_mandatory_job_list(&mut self, ids: &[JobId]) {
        self.state.update_mandatory_job_list(ids);
    }

    pub fn update_desired_job_list(&mut self, ids: &[JobId]) -> PlanUpdate {
        let plan = self.state.update_desired_job_list(ids);
        self.checkpoint();
        plan
    }

    /// Mark `id` as running and persist that, so an interruption from here
    /// on is attributed to this job on resume.
    pub fn start_job(&mut self, id: &str) -> Result<Option<CheckpointWarning>, SessionError> {
        self.state.mark_running(id)?;
        Ok(self.checkpoint())
    }

    /// Record what the runner reported for `id`.
    pub fn update_job_result(
        &mut self,
        id: &str,
        report: JobReport,
    ) -> Result<JobApplied, SessionError> {
        let plugin = self
            .state
            .graph()
            .get(id)
            .map(|u| u.plugin)
            .ok_or_else(|| SessionError::UnknownJob(id.to_string()))?;

        let JobReport {
            result,
            resource_records,
            generated_units,
        } = report;

        let readiness = match plugin {
            Plugin::Resource => {
                self.state
                    .update_resource_job_result(id, result, resource_records)?
            }
            _ => {
                if !resource_records.is_empty() {
                    warn!(job = %id, "records reported by a non-resource job ignored");
                }
                self.state.update_job_result(id, result)?
            }
        };

        let plan = match plugin {
            Plugin::Local if !generated_units.is_empty() => {
                Some(self.state.add_generated_units(id, generated_units)?)
            }
            _ => {
                if !generated_units.is_empty() {
                    warn!(job = %id, "units reported by a non-local job ignored");
                }
                None
            }
        };

        let checkpoint_warning = self.checkpoint();
        Ok(JobApplied {
            readiness,
            plan,
            checkpoint_warning,
        })
    }

    /// Skip every unfinished job and persist the result.
    pub fn abort(&mut self, reason: &str) -> Vec<JobId> {
        let skipped = self.state.mark_remaining_skipped(reason);
        self.checkpoint();
        skipped
    }

    pub fn set_flag(&mut self, flag: &str) {
        self.state.metadata_mut().set_flag(flag);
    }

    pub fn clear_flag(&mut self, flag: &str) {
        self.state.metadata_mut().clear_flag(flag);
    }

    /// Close the session.
    ///
    /// With `discard`, everything stored for it is deleted. Otherwise a final
    /// checkpoint is written; the `incomplete` flag is cleared first if no
    /// job is left to run.
    pub fn close(mut self, discard: bool) -> Result<Vec<CheckpointWarning>, CheckpointError> {
        let id = self.session_id().to_string();

        if discard {
            if self.store.exists(&id) {
                self.store.discard(&id)?;
            }
            info!(session = %id, "session closed and discarded");
            return Ok(self.warnings);
        }

        if self.state.next_job().is_none() {
            self.clear_flag(FLAG_INCOMPLETE);
        }
        self.checkpoint();
        info!(session = %id, "session closed");
        Ok(self.warnings)
    }
}
