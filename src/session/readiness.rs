// src/session/readiness.rs

//! Readiness computation.
//!
//! Readiness is a pure function of the run list, the recorded results, the
//! unit graph and the resource map. [`compute_inhibitors`] recomputes it
//! from scratch for the whole universe; nothing here is patched
//! incrementally.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resource::{ResourceMap, Satisfaction};
use crate::solver::UnitGraph;
use crate::types::{JobId, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InhibitionCause {
    /// Not part of the run list.
    Undesired,
    /// A `depends` or `after` target has no outcome yet.
    PendingDependency,
    /// A `depends` target finished without passing.
    FailedDependency,
    /// A `salvages` target did not fail (or has not run).
    NotFailedDependency,
    /// A resource used by `requires` has no records yet.
    PendingResource,
    /// A `requires` expression evaluated to false.
    FailedResource,
}

/// One reason a job cannot start.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Inhibitor {
    pub cause: InhibitionCause,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_job: Option<JobId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_expression: Option<String>,
}

impl Inhibitor {
    fn undesired() -> Self {
        Self {
            cause: InhibitionCause::Undesired,
            related_job: None,
            related_expression: None,
        }
    }

    fn job(cause: InhibitionCause, job: &str) -> Self {
        Self {
            cause,
            related_job: Some(job.to_string()),
            related_expression: None,
        }
    }

    fn resource(cause: InhibitionCause, job: &str, expression: &str) -> Self {
        Self {
            cause,
            related_job: Some(job.to_string()),
            related_expression: Some(expression.to_string()),
        }
    }
}

impl fmt::Display for Inhibitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let job = self.related_job.as_deref().unwrap_or("?");
        let expr = self.related_expression.as_deref().unwrap_or("?");
        match self.cause {
            InhibitionCause::Undesired => f.write_str("undesired"),
            InhibitionCause::PendingDependency => {
                write!(f, "required dependency {job} did not run yet")
            }
            InhibitionCause::FailedDependency => {
                write!(f, "required dependency {job} has failed")
            }
            InhibitionCause::NotFailedDependency => {
                write!(f, "salvaged job {job} did not fail")
            }
            InhibitionCause::PendingResource => write!(
                f,
                "resource {job} used by expression {expr:?} has not produced data yet"
            ),
            InhibitionCause::FailedResource => {
                write!(f, "resource expression {expr:?} evaluates to false")
            }
        }
    }
}

/// Derived readiness classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Readiness {
    CanStart,
    /// Desired-list membership is missing.
    Undesired,
    BlockedByDependency,
    /// A requirement evaluated to false.
    BlockedByResource,
    /// A requirement is waiting for resource data.
    BlockedByMissingData,
}

impl Readiness {
    /// Classify by the most severe inhibitor: membership, then
    /// dependencies, then failed resources, then pending resources.
    pub fn from_inhibitors(inhibitors: &[Inhibitor]) -> Self {
        let has = |cause: InhibitionCause| inhibitors.iter().any(|i| i.cause == cause);

        if inhibitors.is_empty() {
            Readiness::CanStart
        } else if has(InhibitionCause::Undesired) {
            Readiness::Undesired
        } else if has(InhibitionCause::PendingDependency)
            || has(InhibitionCause::FailedDependency)
            || has(InhibitionCause::NotFailedDependency)
        {
            Readiness::BlockedByDependency
        } else if has(InhibitionCause::FailedResource) {
            Readiness::BlockedByResource
        } else {
            Readiness::BlockedByMissingData
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Readiness::CanStart => "can-start",
            Readiness::Undesired => "undesired",
            Readiness::BlockedByDependency => "blocked-by-dependency",
            Readiness::BlockedByResource => "blocked-by-resource",
            Readiness::BlockedByMissingData => "blocked-by-missing-data",
        })
    }
}

/// Recompute the inhibitors of every unit in `graph`.
///
/// `outcome` reports the recorded outcome of a job, if any.
pub fn compute_inhibitors(
    graph: &UnitGraph,
    run_list: &[JobId],
    outcome: impl Fn(&str) -> Option<Outcome>,
    resources: &ResourceMap,
) -> BTreeMap<JobId, Vec<Inhibitor>> {
    let in_run_list: HashSet<&str> = run_list.iter().map(String::as_str).collect();

    let mut out = BTreeMap::new();
    for (idx, unit) in graph.units().iter().enumerate() {
        if !in_run_list.contains(unit.id.as_str()) {
            out.insert(unit.id.clone(), vec![Inhibitor::undesired()]);
            continue;
        }

        let mut inhibitors = Vec::new();

        for outcome_of in graph.program(idx).evaluate(resources) {
            let expression = outcome_of.expression;
            match outcome_of.satisfaction {
                Satisfaction::Satisfied => {}
                Satisfaction::Indeterminate => {
                    for id in expression.missing_resources(resources) {
                        inhibitors.push(Inhibitor::resource(
                            InhibitionCause::PendingResource,
                            id,
                            expression.text(),
                        ));
                    }
                }
                Satisfaction::Unsatisfied => {
                    for id in expression.resource_ids() {
                        inhibitors.push(Inhibitor::resource(
                            InhibitionCause::FailedResource,
                            id,
                            expression.text(),
                        ));
                    }
                }
            }
        }

        for dep in &unit.depends {
            match outcome(dep) {
                None => inhibitors.push(Inhibitor::job(InhibitionCause::PendingDependency, dep)),
                Some(Outcome::Pass) => {}
                Some(_) => inhibitors.push(Inhibitor::job(InhibitionCause::FailedDependency, dep)),
            }
        }

        for dep in &unit.after {
            if outcome(dep).is_none() {
                inhibitors.push(Inhibitor::job(InhibitionCause::PendingDependency, dep));
            }
        }

        for dep in &unit.salvages {
            if !outcome(dep).is_some_and(Outcome::is_failure) {
                inhibitors.push(Inhibitor::job(InhibitionCause::NotFailedDependency, dep));
            }
        }

        out.insert(unit.id.clone(), inhibitors);
    }

    out
}
