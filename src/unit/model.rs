// src/unit/model.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{JobId, NAMESPACE_SEPARATOR, Plugin};

/// Flag marking a job that is expected to interrupt the session (reboot,
/// power-off...). Such a job is presumed passed when the session resumes.
pub const FLAG_NORETURN: &str = "noreturn";

/// One `imports` binding: `from <namespace> import <partial> [as <alias>]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub namespace: String,
    pub partial_id: String,
    pub alias: String,
}

impl Import {
    /// Fully-qualified id of the imported job.
    pub fn job_id(&self) -> JobId {
        format!("{}{}{}", self.namespace, NAMESPACE_SEPARATOR, self.partial_id)
    }
}

/// Immutable description of a job.
///
/// All ids stored here (`id`, `depends`, `after`, `salvages`) are already
/// fully qualified. Requirement expressions are kept as text and compiled
/// by [`crate::solver::UnitGraph`] when the universe is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: JobId,
    pub plugin: Plugin,

    /// Direct dependencies: must have passed before this job can start.
    #[serde(default)]
    pub depends: Vec<JobId>,

    /// Ordering dependencies: must have finished (any outcome).
    #[serde(default)]
    pub after: Vec<JobId>,

    /// Jobs that must have failed for this job to run.
    #[serde(default)]
    pub salvages: Vec<JobId>,

    /// Requirement program, one expression per entry.
    #[serde(default)]
    pub requires: Vec<String>,

    #[serde(default)]
    pub imports: Vec<Import>,

    /// Opaque to this crate; executed by a [`crate::engine::JobRunner`].
    #[serde(default)]
    pub command: Option<String>,

    /// Environment variables the command is permitted to see.
    #[serde(default)]
    pub environ: Vec<String>,

    #[serde(default)]
    pub flags: BTreeSet<String>,

    /// Expected runtime in seconds.
    #[serde(default)]
    pub estimated_duration: Option<f64>,

    /// Local job that generated this unit at run time, if any.
    #[serde(default)]
    pub via: Option<JobId>,

    /// Where the definition came from (file, provider index...).
    #[serde(default)]
    pub origin: Option<String>,
}

impl Unit {
    pub fn new(id: impl Into<JobId>, plugin: Plugin) -> Self {
        Self {
            id: id.into(),
            plugin,
            depends: Vec::new(),
            after: Vec::new(),
            salvages: Vec::new(),
            requires: Vec::new(),
            imports: Vec::new(),
            command: None,
            environ: Vec::new(),
            flags: BTreeSet::new(),
            estimated_duration: None,
            via: None,
            origin: None,
        }
    }

    /// Namespace part of the id, if the id is qualified.
    pub fn namespace(&self) -> Option<&str> {
        self.id
            .split_once(NAMESPACE_SEPARATOR)
            .map(|(namespace, _)| namespace)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_noreturn(&self) -> bool {
        self.has_flag(FLAG_NORETURN)
    }

    /// Human-readable origin used in problem reports.
    pub fn origin_label(&self) -> String {
        match (&self.origin, &self.via) {
            (Some(origin), _) => origin.clone(),
            (None, Some(via)) => format!("generated by {via}"),
            (None, None) => "<unknown origin>".to_string(),
        }
    }
}
