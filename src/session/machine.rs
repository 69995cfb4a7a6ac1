// src/session/machine.rs

//! The session state machine.
//!
//! `SessionState` is exclusively owned by whoever drives the session. It
//! holds:
//! - the unit universe ([`UnitGraph`]) and the current plan
//! - per-job results and inhibitors
//! - resource records produced so far
//!
//! Every operation that changes an input of readiness (plan, results,
//! resources) ends with a full readiness recomputation.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, info, warn};

use crate::resource::{ResourceMap, ResourceRecord};
use crate::session::SessionError;
use crate::session::metadata::SessionMetadata;
use crate::session::readiness::{Readiness, compute_inhibitors};
use crate::session::state::{JobResult, JobState};
use crate::session::step::{PlanUpdate, ReadinessChange};
use crate::solver::{DependencyProblem, UnitGraph, solve};
use crate::types::{JobId, Outcome, Plugin};
use crate::unit::{Unit, UnitRegistry};

/// Overhead assumed for every manual job on top of its own estimate.
const MANUAL_OVERHEAD_SECS: f64 = 30.0;

/// Estimated remaining runtime, split by who has to be present.
///
/// A component is `None` when at least one job of that kind has no
/// estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationEstimate {
    pub automated: Option<f64>,
    pub manual: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    metadata: SessionMetadata,
    graph: UnitGraph,
    /// Problems found outside the graph: malformed definitions from the
    /// registry and rejected generated units.
    load_problems: Vec<DependencyProblem>,
    solver_problems: Vec<DependencyProblem>,
    plan_version: u64,
    mandatory: Vec<JobId>,
    desired: Vec<JobId>,
    run_list: Vec<JobId>,
    jobs: BTreeMap<JobId, JobState>,
    resources: ResourceMap,
    running: Option<JobId>,
}

fn dedup(ids: &[JobId]) -> Vec<JobId> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

impl SessionState {
    /// A session over `units` with an empty plan.
    pub fn new(units: impl IntoIterator<Item = Unit>, metadata: SessionMetadata) -> Self {
        let graph = UnitGraph::build(units);
        let mut state = Self {
            metadata,
            graph,
            load_problems: Vec::new(),
            solver_problems: Vec::new(),
            plan_version: 0,
            mandatory: Vec::new(),
            desired: Vec::new(),
            run_list: Vec::new(),
            jobs: BTreeMap::new(),
            resources: ResourceMap::new(),
            running: None,
        };
        state.sync_jobs();
        state.recompute_readiness();
        state
    }

    pub fn from_registry(registry: UnitRegistry, metadata: SessionMetadata) -> Self {
        let (units, problems) = registry.into_parts();
        let mut state = Self::new(units, metadata);
        state.load_problems = problems;
        state
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut SessionMetadata {
        &mut self.metadata
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn graph(&self) -> &UnitGraph {
        &self.graph
    }

    pub fn plan_version(&self) -> u64 {
        self.plan_version
    }

    pub fn mandatory_job_list(&self) -> &[JobId] {
        &self.mandatory
    }

    pub fn desired_job_list(&self) -> &[JobId] {
        &self.desired
    }

    pub fn run_list(&self) -> &[JobId] {
        &self.run_list
    }

    pub fn resources(&self) -> &ResourceMap {
        &self.resources
    }

    pub fn running_job(&self) -> Option<&JobId> {
        self.running.as_ref()
    }

    pub fn job_state(&self, id: &str) -> Option<&JobState> {
        self.jobs.get(id)
    }

    pub fn job_states(&self) -> impl Iterator<Item = (&JobId, &JobState)> {
        self.jobs.iter()
    }

    pub fn readiness(&self, id: &str) -> Option<Readiness> {
        self.jobs.get(id).map(JobState::readiness)
    }

    /// Recorded results of every job that has one.
    pub fn results(&self) -> BTreeMap<JobId, JobResult> {
        self.jobs
            .iter()
            .filter_map(|(id, state)| state.result.clone().map(|r| (id.clone(), r)))
            .collect()
    }

    /// Problems reported by the unit registry or while adding generated
    /// units, before any graph was built.
    pub(crate) fn load_problems(&self) -> &[DependencyProblem] {
        &self.load_problems
    }

    /// Every problem of the current plan.
    pub fn problems(&self) -> Vec<DependencyProblem> {
        self.load_problems
            .iter()
            .chain(self.graph.problems())
            .chain(&self.solver_problems)
            .cloned()
            .collect()
    }

    /// Jobs prepended to every desired list from now on. Takes effect on
    /// the next [`update_desired_job_list`](Self::update_desired_job_list).
    pub fn update_mandatory_job_list(&mut self, ids: &[JobId]) {
        self.mandatory = dedup(ids);
    }

    /// Replace the desired list and re-solve the plan.
    ///
    /// Jobs of the previous run list that already ran (or are running) keep
    /// their position; the rest of the new solution is appended after
    /// them.
    pub fn update_desired_job_list(&mut self, ids: &[JobId]) -> PlanUpdate {
        self.desired = dedup(ids);
        self.resolve()
    }

    fn effective_desired(&self) -> Vec<JobId> {
        let combined: Vec<JobId> = self
            .mandatory
            .iter()
            .chain(&self.desired)
            .cloned()
            .collect();
        dedup(&combined)
    }

    fn is_settled(&self, id: &str) -> bool {
        self.running.as_deref() == Some(id)
            || self.jobs.get(id).is_some_and(|s| s.result.is_some())
    }

    fn resolve(&mut self) -> PlanUpdate {
        let solution = solve(&self.graph, &self.effective_desired());

        let mut run_list: Vec<JobId> = self
            .run_list
            .iter()
            .filter(|id| self.is_settled(id))
            .cloned()
            .collect();
        let kept = run_list.len();
        for id in solution.run_list {
            if !run_list.contains(&id) {
                run_list.push(id);
            }
        }

        self.run_list = run_list;
        self.solver_problems = solution.problems;
        self.plan_version += 1;

        info!(
            session = %self.metadata.id,
            version = self.plan_version,
            jobs = self.run_list.len(),
            kept,
            problems = self.solver_problems.len(),
            "plan solved"
        );

        self.recompute_readiness();
        self.plan_update()
    }

    /// The current plan with its problems.
    pub fn plan_update(&self) -> PlanUpdate {
        PlanUpdate {
            version: self.plan_version,
            run_list: self.run_list.clone(),
            problems: self.problems(),
        }
    }

    fn sync_jobs(&mut self) {
        for unit in self.graph.units() {
            self.jobs.entry(unit.id.clone()).or_default();
        }
    }

    /// Recompute every job's inhibitors. Returns the jobs whose readiness
    /// classification changed.
    fn recompute_readiness(&mut self) -> BTreeSet<JobId> {
        let jobs = &self.jobs;
        let fresh = compute_inhibitors(
            &self.graph,
            &self.run_list,
            |id| jobs.get(id).and_then(JobState::outcome),
            &self.resources,
        );

        let mut changed = BTreeSet::new();
        for (id, inhibitors) in fresh {
            let state = self.jobs.entry(id.clone()).or_default();
            let before = state.readiness();
            state.inhibitors = inhibitors;
            if state.readiness() != before {
                changed.insert(id);
            }
        }
        changed
    }

    /// First job of the run list without a result.
    pub fn next_job(&self) -> Option<&JobId> {
        self.run_list
            .iter()
            .find(|id| self.jobs.get(id.as_str()).is_some_and(|s| s.result.is_none()))
    }

    fn check_in_run_list(&self, id: &str) -> Result<(), SessionError> {
        if !self.jobs.contains_key(id) {
            return Err(SessionError::UnknownJob(id.to_string()));
        }
        if !self.run_list.iter().any(|j| j == id) {
            return Err(SessionError::NotInRunList(id.to_string()));
        }
        Ok(())
    }

    /// Record that `id` has been handed to the job runner.
    pub fn mark_running(&mut self, id: &str) -> Result<(), SessionError> {
        self.check_in_run_list(id)?;

        if let Some(running) = &self.running {
            if running != id {
                return Err(SessionError::AlreadyRunning {
                    running: running.clone(),
                    requested: id.to_string(),
                });
            }
        }

        let state = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownJob(id.to_string()))?;

        if let Some(outcome) = state.outcome() {
            return Err(SessionError::NotRunnable {
                id: id.to_string(),
                reasons: format!("it already has outcome {outcome}"),
            });
        }
        if !state.can_start() {
            let reasons = state
                .inhibitors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(SessionError::NotRunnable {
                id: id.to_string(),
                reasons,
            });
        }

        state.running = true;
        self.running = Some(id.to_string());
        debug!(job = %id, "job marked running");
        Ok(())
    }

    /// Record the terminal result of `id` and recompute readiness.
    ///
    /// Recording the same outcome twice is a no-op (the first result is
    /// kept). Recording a different outcome is an error.
    pub fn update_job_result(
        &mut self,
        id: &str,
        result: JobResult,
    ) -> Result<ReadinessChange, SessionError> {
        self.record_result(id, result, None)
    }

    /// Like [`update_job_result`](Self::update_job_result), for a resource
    /// job. When the job passed, `records` replace whatever the job
    /// produced before.
    pub fn update_resource_job_result(
        &mut self,
        id: &str,
        result: JobResult,
        records: Vec<ResourceRecord>,
    ) -> Result<ReadinessChange, SessionError> {
        self.record_result(id, result, Some(records))
    }

    fn record_result(
        &mut self,
        id: &str,
        result: JobResult,
        records: Option<Vec<ResourceRecord>>,
    ) -> Result<ReadinessChange, SessionError> {
        self.check_in_run_list(id)?;

        let outcome = result.outcome;
        let plugin = self.graph.get(id).map(|u| u.plugin);
        let state = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownJob(id.to_string()))?;

        match state.outcome() {
            Some(recorded) if recorded != outcome => {
                return Err(SessionError::OutcomeConflict {
                    id: id.to_string(),
                    recorded,
                    requested: outcome,
                });
            }
            Some(_) => debug!(job = %id, %outcome, "repeated result ignored"),
            None => {
                state.result = Some(result);
                info!(job = %id, %outcome, "job result recorded");
            }
        }
        state.running = false;
        if self.running.as_deref() == Some(id) {
            self.running = None;
        }

        if let Some(records) = records {
            match plugin {
                Some(Plugin::Resource) if outcome == Outcome::Pass => {
                    debug!(job = %id, records = records.len(), "resource records stored");
                    self.resources.set(id, records);
                }
                Some(Plugin::Resource) => {
                    debug!(job = %id, %outcome, "resource job did not pass; records dropped");
                }
                _ => warn!(job = %id, "records reported by a non-resource job ignored"),
            }
        }

        let changed = self.recompute_readiness();
        Ok(ReadinessChange {
            job: id.to_string(),
            affected: self.graph.affected_by(id),
            changed,
        })
    }

    /// Add units generated by the local job `via` and re-solve.
    ///
    /// Generated units get `via` set and are appended to the desired list.
    /// A generated unit that is itself a local job is rejected as
    /// unsupported.
    pub fn add_generated_units(
        &mut self,
        via: &str,
        units: Vec<Unit>,
    ) -> Result<PlanUpdate, SessionError> {
        let parent = self
            .graph
            .get(via)
            .ok_or_else(|| SessionError::UnknownJob(via.to_string()))?;
        if parent.plugin != Plugin::Local {
            return Err(SessionError::NotLocal(via.to_string()));
        }

        let mut accepted = Vec::new();
        for mut unit in units {
            unit.via = Some(via.to_string());
            if unit.plugin == Plugin::Local {
                warn!(job = %unit.id, %via, "nested local job rejected");
                self.load_problems.push(DependencyProblem::Unsupported {
                    id: unit.id.clone(),
                    message: format!(
                        "local job generated by local job {via}; nested local jobs are not supported"
                    ),
                });
                continue;
            }
            accepted.push(unit);
        }

        let new_ids: Vec<JobId> = accepted.iter().map(|u| u.id.clone()).collect();
        info!(%via, units = new_ids.len(), "generated units added");

        self.graph = self.graph.extend(accepted);
        self.sync_jobs();

        for id in new_ids {
            if !self.desired.contains(&id) {
                self.desired.push(id);
            }
        }

        Ok(self.resolve())
    }

    /// Give every unfinished job of the run list a `Skip` result.
    ///
    /// Used when the operator aborts the session. Returns the skipped jobs.
    pub fn mark_remaining_skipped(&mut self, reason: &str) -> Vec<JobId> {
        let mut skipped = Vec::new();
        for id in &self.run_list {
            let Some(state) = self.jobs.get_mut(id) else {
                continue;
            };
            if state.result.is_none() {
                state.result = Some(JobResult::new(Outcome::Skip).with_comments(reason));
                state.running = false;
                skipped.push(id.clone());
            }
        }
        self.running = None;

        info!(jobs = skipped.len(), %reason, "remaining jobs skipped");
        self.recompute_readiness();
        skipped
    }

    /// Number of recorded results per outcome.
    pub fn outcome_stats(&self) -> BTreeMap<Outcome, usize> {
        let mut stats = BTreeMap::new();
        for outcome in self.jobs.values().filter_map(JobState::outcome) {
            *stats.entry(outcome).or_insert(0) += 1;
        }
        stats
    }

    /// Estimated runtime of the jobs of the run list that have no result.
    pub fn estimated_duration(&self) -> DurationEstimate {
        let mut automated = Some(0.0);
        let mut manual = Some(0.0);

        for id in &self.run_list {
            if self.is_settled(id) {
                continue;
            }
            let Some(unit) = self.graph.get(id) else {
                continue;
            };
            let slot = if unit.plugin.is_automated() {
                &mut automated
            } else {
                &mut manual
            };
            *slot = match (*slot, unit.estimated_duration) {
                (Some(total), Some(secs)) if unit.plugin.is_automated() => Some(total + secs),
                (Some(total), Some(secs)) => Some(total + secs + MANUAL_OVERHEAD_SECS),
                _ => None,
            };
        }

        DurationEstimate { automated, manual }
    }

    /// Rebuild a session from persisted parts.
    ///
    /// The plan is re-solved against the stored run list so its executed
    /// prefix is kept verbatim.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        metadata: SessionMetadata,
        units: Vec<Unit>,
        mandatory: Vec<JobId>,
        desired: Vec<JobId>,
        run_list: Vec<JobId>,
        results: BTreeMap<JobId, JobResult>,
        resources: ResourceMap,
        running: Option<JobId>,
        load_problems: Vec<DependencyProblem>,
    ) -> Self {
        let mut state = Self::new(units, metadata);
        state.load_problems = load_problems;
        state.mandatory = mandatory;
        state.desired = desired;
        state.resources = resources;

        for (id, result) in results {
            match state.jobs.get_mut(&id) {
                Some(job) => job.result = Some(result),
                None => warn!(job = %id, "stored result for unknown job dropped"),
            }
        }

        if let Some(id) = running {
            match state.jobs.get_mut(&id) {
                Some(job) if job.result.is_none() => {
                    job.running = true;
                    state.running = Some(id);
                }
                _ => warn!(job = %id, "stored running job is unknown or finished"),
            }
        }

        state.run_list = run_list;
        state.resolve();
        state
    }
}
