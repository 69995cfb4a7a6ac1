// src/solver/solve.rs

//! Deterministic, fail-soft dependency solver.
//!
//! The solver expands the desired job list depth-first, following `depends`
//! then `after` in declaration order, and emits every job after its
//! dependencies. When an attempt hits a cycle or an unresolvable reference,
//! the offending jobs are excluded and the attempt is restarted on the
//! remaining graph. Jobs that depended on an excluded job are therefore
//! reported as missing that dependency on a later attempt.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::solver::graph::UnitGraph;
use crate::solver::problem::{DependencyKind, DependencyProblem};
use crate::types::JobId;

/// Run list plus every problem hit while producing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub run_list: Vec<JobId>,
    pub problems: Vec<DependencyProblem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

struct Failure {
    problem: DependencyProblem,
    exclude: Vec<usize>,
}

/// Solves desired job lists against one [`UnitGraph`].
#[derive(Debug, Clone, Copy)]
pub struct DependencySolver<'g> {
    graph: &'g UnitGraph,
}

impl<'g> DependencySolver<'g> {
    pub fn new(graph: &'g UnitGraph) -> Self {
        Self { graph }
    }

    /// Solve `desired` into a run list.
    ///
    /// Only solver problems are returned here; problems found while
    /// building the graph are available from [`UnitGraph::problems`].
    pub fn solve(&self, desired: &[JobId]) -> Solution {
        let mut problems = Vec::new();
        let mut roots: Vec<usize> = Vec::new();

        for id in desired {
            match self.graph.index_of(id) {
                Some(idx) if !roots.contains(&idx) => roots.push(idx),
                Some(_) => {}
                None => {
                    warn!(job = %id, "desired job is unknown; ignoring");
                    problems.push(DependencyProblem::Unknown { id: id.clone() });
                }
            }
        }

        let mut excluded: HashSet<usize> = self.graph.broken().iter().copied().collect();

        loop {
            let mut attempt = Attempt::new(self.graph, &excluded);
            match attempt.run(&roots) {
                Ok(order) => {
                    let run_list: Vec<JobId> = order
                        .into_iter()
                        .map(|idx| self.graph.unit(idx).id.clone())
                        .collect();
                    debug!(
                        jobs = run_list.len(),
                        problems = problems.len(),
                        "dependency solver finished"
                    );
                    return Solution { run_list, problems };
                }
                Err(failure) => {
                    warn!(problem = %failure.problem, "excluding jobs from run list");
                    problems.push(failure.problem);
                    excluded.extend(failure.exclude);
                }
            }
        }
    }
}

/// Convenience wrapper around [`DependencySolver::solve`].
pub fn solve(graph: &UnitGraph, desired: &[JobId]) -> Solution {
    DependencySolver::new(graph).solve(desired)
}

/// A job being expanded, with the position of its next expansion edge.
struct Frame {
    idx: usize,
    edges: Vec<(DependencyKind, JobId)>,
    next: usize,
}

/// One depth-first pass over the residual graph.
struct Attempt<'a> {
    graph: &'a UnitGraph,
    excluded: &'a HashSet<usize>,
    color: Vec<Color>,
    trail: Vec<usize>,
    order: Vec<usize>,
}

impl<'a> Attempt<'a> {
    fn new(graph: &'a UnitGraph, excluded: &'a HashSet<usize>) -> Self {
        Self {
            graph,
            excluded,
            color: vec![Color::White; graph.len()],
            trail: Vec::new(),
            order: Vec::new(),
        }
    }

    fn run(&mut self, roots: &[usize]) -> Result<Vec<usize>, Failure> {
        for &root in roots {
            if self.excluded.contains(&root) {
                continue;
            }
            self.visit(root)?;
        }
        Ok(std::mem::take(&mut self.order))
    }

    fn resolve(&self, id: &str) -> Option<usize> {
        self.graph
            .index_of(id)
            .filter(|idx| !self.excluded.contains(idx))
    }

    /// Depth-first expansion from `root` with an explicit stack, so long
    /// dependency chains do not grow the call stack.
    fn visit(&mut self, root: usize) -> Result<(), Failure> {
        if !self.enter(root)? {
            return Ok(());
        }
        let mut stack = vec![self.frame(root)];

        while let Some(frame) = stack.last_mut() {
            let idx = frame.idx;
            if let Some((kind, dep_id)) = frame.edges.get(frame.next).cloned() {
                frame.next += 1;
                let Some(dep) = self.resolve(&dep_id) else {
                    return Err(self.missing(idx, dep_id, kind));
                };
                if self.enter(dep)? {
                    stack.push(self.frame(dep));
                }
                continue;
            }

            stack.pop();
            self.finish(idx)?;
        }
        Ok(())
    }

    fn frame(&self, idx: usize) -> Frame {
        Frame {
            idx,
            edges: self
                .graph
                .expansion_edges(idx)
                .map(|(kind, id)| (kind, id.to_string()))
                .collect(),
            next: 0,
        }
    }

    /// Mark `idx` as in progress. `Ok(false)` when it is already done.
    fn enter(&mut self, idx: usize) -> Result<bool, Failure> {
        match self.color[idx] {
            Color::Black => Ok(false),
            Color::Gray => {
                let start = self
                    .trail
                    .iter()
                    .position(|&i| i == idx)
                    .unwrap_or(0);
                let members = self.trail[start..].to_vec();
                let mut path: Vec<JobId> = members
                    .iter()
                    .map(|&i| self.graph.unit(i).id.clone())
                    .collect();
                path.push(self.graph.unit(idx).id.clone());
                Err(Failure {
                    problem: DependencyProblem::Cycle { path },
                    exclude: members,
                })
            }
            Color::White => {
                self.color[idx] = Color::Gray;
                self.trail.push(idx);
                Ok(true)
            }
        }
    }

    fn finish(&mut self, idx: usize) -> Result<(), Failure> {
        // Salvage and resource targets must exist, but are not pulled in.
        for (kind, ref_id) in self.graph.references(idx) {
            if self.resolve(&ref_id).is_none() {
                return Err(self.missing(idx, ref_id, kind));
            }
        }

        self.trail.pop();
        self.color[idx] = Color::Black;
        self.order.push(idx);
        Ok(())
    }

    fn missing(&self, idx: usize, id: JobId, dependency: DependencyKind) -> Failure {
        Failure {
            problem: DependencyProblem::Missing {
                id,
                referenced_by: self.graph.unit(idx).id.clone(),
                dependency,
            },
            exclude: vec![idx],
        }
    }
}
