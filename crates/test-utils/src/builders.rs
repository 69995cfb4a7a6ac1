#![allow(dead_code)]

use sessiondag::config::{
    CheckpointSection, PlanFile, ProviderConfig, RawPlanFile, SelectionSection, SessionSection,
    UnitConfig,
};
use sessiondag::types::Plugin;
use sessiondag::unit::Unit;

/// Builder for already-qualified `Unit`s, for tests that bypass the registry.
pub struct UnitBuilder {
    unit: Unit,
}

impl UnitBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            unit: Unit::new(id, Plugin::Shell),
        }
    }

    pub fn resource(id: &str) -> Self {
        Self::new(id).plugin(Plugin::Resource)
    }

    pub fn local(id: &str) -> Self {
        Self::new(id).plugin(Plugin::Local)
    }

    pub fn plugin(mut self, plugin: Plugin) -> Self {
        self.unit.plugin = plugin;
        self
    }

    pub fn depends(mut self, dep: &str) -> Self {
        self.unit.depends.push(dep.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.unit.after.push(dep.to_string());
        self
    }

    pub fn salvages(mut self, dep: &str) -> Self {
        self.unit.salvages.push(dep.to_string());
        self
    }

    pub fn requires(mut self, expr: &str) -> Self {
        self.unit.requires.push(expr.to_string());
        self
    }

    pub fn command(mut self, cmd: &str) -> Self {
        self.unit.command = Some(cmd.to_string());
        self
    }

    pub fn flag(mut self, flag: &str) -> Self {
        self.unit.flags.insert(flag.to_string());
        self
    }

    pub fn estimated_duration(mut self, secs: f64) -> Self {
        self.unit.estimated_duration = Some(secs);
        self
    }

    pub fn build(self) -> Unit {
        self.unit
    }
}

/// Builder for raw `UnitConfig`s, as they appear in a plan file.
pub struct UnitConfigBuilder {
    unit: UnitConfig,
}

impl UnitConfigBuilder {
    pub fn new(id: &str, plugin: &str) -> Self {
        Self {
            unit: UnitConfig {
                id: id.to_string(),
                plugin: plugin.to_string(),
                ..UnitConfig::default()
            },
        }
    }

    pub fn depends(mut self, words: &str) -> Self {
        self.unit.depends = Some(words.to_string());
        self
    }

    pub fn after(mut self, words: &str) -> Self {
        self.unit.after = Some(words.to_string());
        self
    }

    pub fn salvages(mut self, words: &str) -> Self {
        self.unit.salvages = Some(words.to_string());
        self
    }

    pub fn requires(mut self, expr: &str) -> Self {
        self.unit.requires.push(expr.to_string());
        self
    }

    pub fn imports(mut self, text: &str) -> Self {
        self.unit.imports = Some(text.to_string());
        self
    }

    pub fn flags(mut self, words: &str) -> Self {
        self.unit.flags = Some(words.to_string());
        self
    }

    pub fn command(mut self, cmd: &str) -> Self {
        self.unit.command = Some(cmd.to_string());
        self
    }

    pub fn estimated_duration(mut self, secs: f64) -> Self {
        self.unit.estimated_duration = Some(secs);
        self
    }

    pub fn build(self) -> UnitConfig {
        self.unit
    }
}

/// Builder for `PlanFile` to simplify test setup.
pub struct PlanBuilder {
    plan: RawPlanFile,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self {
            plan: RawPlanFile {
                session: SessionSection::default(),
                checkpoint: CheckpointSection::default(),
                selection: SelectionSection::default(),
                provider: Vec::new(),
            },
        }
    }

    pub fn with_provider(mut self, namespace: &str, units: Vec<UnitConfig>) -> Self {
        self.plan.provider.push(ProviderConfig {
            namespace: namespace.to_string(),
            unit: units,
        });
        self
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.plan.selection.include.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.plan.selection.exclude.push(pattern.to_string());
        self
    }

    pub fn mandatory(mut self, id: &str) -> Self {
        self.plan.selection.mandatory.push(id.to_string());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.plan.session.title = Some(title.to_string());
        self
    }

    pub fn raw(self) -> RawPlanFile {
        self.plan
    }

    pub fn build(self) -> PlanFile {
        PlanFile::try_from(self.plan).expect("Failed to build valid plan from builder")
    }
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}
