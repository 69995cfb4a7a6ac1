// src/solver/problem.rs

//! Problems found while building the unit universe or solving a plan.
//!
//! None of these are fatal: the offending units are excluded from the run
//! list and the problems are reported alongside it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::JobId;

/// Which kind of reference could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    Direct,
    Ordering,
    Salvage,
    Resource,
}

impl DependencyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyKind::Direct => "depends",
            DependencyKind::Ordering => "after",
            DependencyKind::Salvage => "salvages",
            DependencyKind::Resource => "requires",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DependencyProblem {
    /// `path` starts and ends with the same job.
    Cycle { path: Vec<JobId> },

    /// Two different definitions share one id; `second` was dropped.
    Duplicate {
        id: JobId,
        first: String,
        second: String,
    },

    /// `referenced_by` points at `id`, which is unknown or excluded.
    Missing {
        id: JobId,
        referenced_by: JobId,
        dependency: DependencyKind,
    },

    /// A desired job id that names no unit.
    Unknown { id: JobId },

    /// A `requires` line of `id` does not parse.
    Expression {
        id: JobId,
        expression: String,
        message: String,
    },

    /// A unit definition that cannot be used at all.
    Malformed { id: JobId, message: String },

    /// A unit that is well-formed but cannot be accepted (e.g. a local job
    /// generated by another local job).
    Unsupported { id: JobId, message: String },
}

impl DependencyProblem {
    /// The job the problem is attributed to.
    pub fn affected_job(&self) -> &str {
        match self {
            DependencyProblem::Cycle { path } => path.first().map(String::as_str).unwrap_or(""),
            DependencyProblem::Duplicate { id, .. }
            | DependencyProblem::Unknown { id }
            | DependencyProblem::Expression { id, .. }
            | DependencyProblem::Malformed { id, .. }
            | DependencyProblem::Unsupported { id, .. } => id,
            DependencyProblem::Missing { referenced_by, .. } => referenced_by,
        }
    }
}

impl fmt::Display for DependencyProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyProblem::Cycle { path } => {
                write!(f, "dependency cycle detected: {}", path.join(" -> "))
            }
            DependencyProblem::Duplicate { id, first, second } => write!(
                f,
                "duplicate definition of job {id} ({second} clashes with {first}); \
                 the later definition was ignored"
            ),
            DependencyProblem::Missing {
                id,
                referenced_by,
                dependency,
            } => write!(
                f,
                "missing dependency: job {referenced_by} refers to {id} via `{}`",
                dependency.as_str()
            ),
            DependencyProblem::Unknown { id } => write!(f, "unknown job {id} was requested"),
            DependencyProblem::Expression {
                id,
                expression,
                message,
            } => write!(
                f,
                "job {id} has an invalid requirement {expression:?}: {message}"
            ),
            DependencyProblem::Malformed { id, message } => {
                write!(f, "malformed unit {id}: {message}")
            }
            DependencyProblem::Unsupported { id, message } => {
                write!(f, "unsupported unit {id}: {message}")
            }
        }
    }
}

/// All problems of one plan, rendered together.
#[derive(Debug, Clone, Copy)]
pub struct ProblemReport<'a>(pub &'a [DependencyProblem]);

impl fmt::Display for ProblemReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no problems");
        }
        writeln!(f, "{} problem(s):", self.0.len())?;
        for problem in self.0 {
            writeln!(f, "  - {problem}")?;
        }
        Ok(())
    }
}
