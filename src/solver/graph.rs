// src/solver/graph.rs

use std::collections::{BTreeSet, HashMap};

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use tracing::{debug, warn};

use crate::resource::RequirementProgram;
use crate::solver::problem::{DependencyKind, DependencyProblem};
use crate::types::JobId;
use crate::unit::Unit;

/// The unit universe of a session, indexed for solving and readiness.
///
/// Units live in an arena (`Vec<Unit>`) and are referred to by index. Each
/// unit's `requires` program is compiled once here. A unit whose program
/// does not compile is kept in the universe (so it can be reported and
/// inspected) but is marked broken and never scheduled.
///
/// The influence graph has an edge `producer -> consumer` for every
/// `depends`, `after`, `salvages` and resource reference, so the set of
/// jobs whose readiness may change after a job finishes is its reachable
/// set.
#[derive(Debug, Clone)]
pub struct UnitGraph {
    units: Vec<Unit>,
    index: HashMap<JobId, usize>,
    programs: Vec<RequirementProgram>,
    broken: BTreeSet<usize>,
    influence: DiGraphMap<usize, ()>,
    problems: Vec<DependencyProblem>,
}

impl UnitGraph {
    /// Build the universe from `units`, in order.
    ///
    /// Identical redefinitions are merged silently. A differing
    /// redefinition is reported as a duplicate and the later one is
    /// dropped.
    pub fn build(units: impl IntoIterator<Item = Unit>) -> Self {
        let mut graph = Self {
            units: Vec::new(),
            index: HashMap::new(),
            programs: Vec::new(),
            broken: BTreeSet::new(),
            influence: DiGraphMap::new(),
            problems: Vec::new(),
        };

        for unit in units {
            graph.insert(unit);
        }
        graph.link();

        debug!(
            units = graph.units.len(),
            broken = graph.broken.len(),
            problems = graph.problems.len(),
            "unit graph built"
        );
        graph
    }

    /// A new graph holding every unit of `self` followed by `extra`.
    pub fn extend(&self, extra: impl IntoIterator<Item = Unit>) -> Self {
        Self::build(self.units.iter().cloned().chain(extra))
    }

    fn insert(&mut self, unit: Unit) {
        if unit.id.trim().is_empty() {
            self.problems.push(DependencyProblem::Malformed {
                id: unit.id.clone(),
                message: format!("unit from {} has an empty id", unit.origin_label()),
            });
            return;
        }

        if let Some(&existing) = self.index.get(&unit.id) {
            let first = &self.units[existing];
            if first == &unit {
                debug!(job = %unit.id, "identical redefinition merged");
            } else {
                warn!(job = %unit.id, "conflicting redefinition ignored");
                self.problems.push(DependencyProblem::Duplicate {
                    id: unit.id.clone(),
                    first: first.origin_label(),
                    second: unit.origin_label(),
                });
            }
            return;
        }

        let idx = self.units.len();
        let program = match RequirementProgram::compile(
            &unit.requires,
            unit.namespace(),
            &unit.imports,
        ) {
            Ok(program) => program,
            Err(err) => {
                warn!(job = %unit.id, error = %err, "requirement does not compile");
                self.problems.push(DependencyProblem::Expression {
                    id: unit.id.clone(),
                    expression: err.expression.clone(),
                    message: err.source.to_string(),
                });
                self.broken.insert(idx);
                RequirementProgram::default()
            }
        };

        self.index.insert(unit.id.clone(), idx);
        self.influence.add_node(idx);
        self.programs.push(program);
        self.units.push(unit);
    }

    fn link(&mut self) {
        for idx in 0..self.units.len() {
            let producers: Vec<usize> = self
                .references(idx)
                .into_iter()
                .filter_map(|(_, id)| self.index.get(&id).copied())
                .collect();
            for producer in producers {
                self.influence.add_edge(producer, idx, ());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, idx: usize) -> &Unit {
        &self.units[idx]
    }

    pub fn get(&self, id: &str) -> Option<&Unit> {
        self.index.get(id).map(|&idx| &self.units[idx])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn program(&self, idx: usize) -> &RequirementProgram {
        &self.programs[idx]
    }

    pub fn program_of(&self, id: &str) -> Option<&RequirementProgram> {
        self.index.get(id).map(|&idx| &self.programs[idx])
    }

    /// Whether the unit can never be scheduled (its requirement program is
    /// invalid).
    pub fn is_broken(&self, idx: usize) -> bool {
        self.broken.contains(&idx)
    }

    pub(crate) fn broken(&self) -> &BTreeSet<usize> {
        &self.broken
    }

    /// Problems found while building the universe.
    pub fn problems(&self) -> &[DependencyProblem] {
        &self.problems
    }

    /// Edges the solver expands: `depends` first, then `after`, each in
    /// declaration order.
    pub fn expansion_edges(&self, idx: usize) -> impl Iterator<Item = (DependencyKind, &str)> {
        let unit = &self.units[idx];
        unit.depends
            .iter()
            .map(|id| (DependencyKind::Direct, id.as_str()))
            .chain(unit.after.iter().map(|id| (DependencyKind::Ordering, id.as_str())))
    }

    /// Every job id `idx` refers to, expansion edges first, then salvages,
    /// then resources.
    pub fn references(&self, idx: usize) -> Vec<(DependencyKind, JobId)> {
        let unit = &self.units[idx];
        let mut refs: Vec<(DependencyKind, JobId)> = self
            .expansion_edges(idx)
            .map(|(kind, id)| (kind, id.to_string()))
            .collect();
        refs.extend(
            unit.salvages
                .iter()
                .map(|id| (DependencyKind::Salvage, id.clone())),
        );
        refs.extend(
            self.programs[idx]
                .required_resources()
                .into_iter()
                .map(|id| (DependencyKind::Resource, id)),
        );
        refs
    }

    /// Direct consumers of `id` (jobs that reference it in any way).
    pub fn dependents_of(&self, id: &str) -> Vec<JobId> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        let mut out: Vec<JobId> = self
            .influence
            .neighbors(idx)
            .map(|n| self.units[n].id.clone())
            .collect();
        out.sort();
        out
    }

    /// Every job whose readiness may change once `id` finishes, excluding
    /// `id` itself.
    pub fn affected_by(&self, id: &str) -> BTreeSet<JobId> {
        let mut out = BTreeSet::new();
        let Some(start) = self.index_of(id) else {
            return out;
        };

        let mut dfs = Dfs::new(&self.influence, start);
        while let Some(node) = dfs.next(&self.influence) {
            if node != start {
                out.insert(self.units[node].id.clone());
            }
        }
        out
    }
}
