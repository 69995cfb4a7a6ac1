// src/solver/mod.rs

//! Unit universe and dependency solving.
//!
//! - [`graph`] indexes the unit universe and its influence relation.
//! - [`solve`] turns a desired job list into an ordered run list.
//! - [`problem`] describes everything that made a job unschedulable.

pub mod graph;
pub mod problem;
pub mod solve;

pub use graph::UnitGraph;
pub use problem::{DependencyKind, DependencyProblem, ProblemReport};
pub use solve::{DependencySolver, Solution, solve};
