// src/config/selection.rs

//! Turning `[selection]` into a desired job list.

use regex::Regex;
use tracing::debug;

use crate::config::model::SelectionSection;
use crate::errors::{Result, SessionDagError};
use crate::types::JobId;
use crate::unit::Unit;

/// Compiled `[selection]` patterns.
#[derive(Debug, Clone)]
pub struct Selection {
    mandatory: Vec<JobId>,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

/// Anchor `pattern` so it has to match the whole id.
fn compile_full_match(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|err| {
        SessionDagError::ConfigError(format!("invalid selection pattern {pattern:?}: {err}"))
    })
}

impl Selection {
    pub fn compile(section: &SelectionSection) -> Result<Self> {
        let include = section
            .include
            .iter()
            .map(|p| compile_full_match(p))
            .collect::<Result<Vec<_>>>()?;
        let exclude = section
            .exclude
            .iter()
            .map(|p| compile_full_match(p))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            mandatory: section
                .mandatory
                .iter()
                .map(|id| id.trim().to_string())
                .collect(),
            include,
            exclude,
        })
    }

    pub fn mandatory(&self) -> &[JobId] {
        &self.mandatory
    }

    /// Whether `id` is included and not excluded.
    pub fn matches(&self, id: &str) -> bool {
        self.include.iter().any(|re| re.is_match(id))
            && !self.exclude.iter().any(|re| re.is_match(id))
    }

    /// Ids of `units` that match, in declaration order.
    pub fn select(&self, units: &[Unit]) -> Vec<JobId> {
        let selected: Vec<JobId> = units
            .iter()
            .filter(|u| self.matches(&u.id))
            .map(|u| u.id.clone())
            .collect();
        debug!(selected = selected.len(), total = units.len(), "selection applied");
        selected
    }
}
