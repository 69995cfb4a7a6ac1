// src/unit/registry.rs

//! Explicit registry of unit providers.
//!
//! A provider is a namespace plus the raw unit definitions it ships. The
//! registry qualifies every id with its provider's namespace and turns the
//! textual fields into a [`Unit`]. Definitions that cannot be converted are
//! kept as [`DependencyProblem::Malformed`] entries instead of failing the
//! whole load.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::config::model::UnitConfig;
use crate::solver::DependencyProblem;
use crate::types::{JobId, Plugin};
use crate::unit::model::Unit;
use crate::unit::tokens::{parse_imports, qualify_id, split_word_list};

/// One unit provider.
#[derive(Debug, Clone, Default)]
pub struct Provider {
    pub namespace: String,
    pub units: Vec<UnitConfig>,
}

impl Provider {
    pub fn new(namespace: impl Into<String>, units: Vec<UnitConfig>) -> Self {
        Self {
            namespace: namespace.into(),
            units,
        }
    }
}

/// Every unit known to a session, in registration order.
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    namespaces: Vec<String>,
    units: Vec<Unit>,
    problems: Vec<DependencyProblem>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_providers(providers: impl IntoIterator<Item = Provider>) -> Self {
        let mut registry = Self::new();
        for provider in providers {
            registry.add_provider(provider);
        }
        registry
    }

    pub fn add_provider(&mut self, provider: Provider) {
        let Provider { namespace, units } = provider;

        for (n, cfg) in units.iter().enumerate() {
            let origin = format!("provider {namespace}, unit #{}", n + 1);
            match unit_from_config(&namespace, cfg, origin) {
                Ok(unit) => self.units.push(unit),
                Err(message) => {
                    let id = qualify_id(Some(&namespace), cfg.id.trim());
                    warn!(job = %id, %message, "malformed unit definition");
                    self.problems.push(DependencyProblem::Malformed { id, message });
                }
            }
        }

        debug!(%namespace, units = units.len(), "provider registered");
        if !self.namespaces.contains(&namespace) {
            self.namespaces.push(namespace);
        }
    }

    /// Register an already-built unit as is.
    pub fn add_unit(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn problems(&self) -> &[DependencyProblem] {
        &self.problems
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Unit>, Vec<DependencyProblem>) {
        (self.units, self.problems)
    }
}

fn qualify_all(namespace: &str, field: Option<&str>) -> Vec<JobId> {
    field
        .map(split_word_list)
        .unwrap_or_default()
        .iter()
        .map(|id| qualify_id(Some(namespace), id))
        .collect()
}

/// Convert one raw definition from `namespace` into a qualified unit.
pub fn unit_from_config(
    namespace: &str,
    cfg: &UnitConfig,
    origin: String,
) -> Result<Unit, String> {
    let partial = cfg.id.trim();
    if partial.is_empty() {
        return Err(format!("{origin}: empty id"));
    }
    if partial.contains(char::is_whitespace) {
        return Err(format!("{origin}: id {partial:?} contains whitespace"));
    }

    let plugin: Plugin = cfg.plugin.parse()?;

    let imports = match cfg.imports.as_deref() {
        Some(text) => parse_imports(text)?,
        None => Vec::new(),
    };

    let requires: Vec<String> = cfg
        .requires
        .iter()
        .flat_map(|entry| entry.lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if let Some(duration) = cfg.estimated_duration {
        if !duration.is_finite() || duration < 0.0 {
            return Err(format!(
                "estimated_duration must be a non-negative number (got {duration})"
            ));
        }
    }

    let mut unit = Unit::new(qualify_id(Some(namespace), partial), plugin);
    unit.depends = qualify_all(namespace, cfg.depends.as_deref());
    unit.after = qualify_all(namespace, cfg.after.as_deref());
    unit.salvages = qualify_all(namespace, cfg.salvages.as_deref());
    unit.requires = requires;
    unit.imports = imports;
    unit.command = cfg.command.clone();
    unit.environ = cfg
        .environ
        .as_deref()
        .map(split_word_list)
        .unwrap_or_default();
    unit.flags = cfg
        .flags
        .as_deref()
        .map(split_word_list)
        .unwrap_or_default()
        .into_iter()
        .collect::<BTreeSet<_>>();
    unit.estimated_duration = cfg.estimated_duration;
    unit.origin = Some(origin);

    Ok(unit)
}
