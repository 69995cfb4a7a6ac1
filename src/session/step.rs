// src/session/step.rs

//! Result types returned by the session state machine.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::solver::DependencyProblem;
use crate::types::JobId;

/// What changed after recording a job result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadinessChange {
    pub job: JobId,

    /// Jobs reachable from `job` over the influence graph, i.e. every job
    /// whose readiness could depend on this result.
    pub affected: BTreeSet<JobId>,

    /// Jobs whose readiness actually differs after recomputation.
    pub changed: BTreeSet<JobId>,
}

/// Outcome of (re)solving the plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanUpdate {
    /// Bumped on every re-solve.
    pub version: u64,
    pub run_list: Vec<JobId>,

    /// Every problem of the current plan, including the ones found when
    /// the unit universe was loaded.
    pub problems: Vec<DependencyProblem>,
}
