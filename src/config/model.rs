// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::checkpoint::{BackoffPolicy, RetryPolicy};
use crate::unit::{Provider, UnitRegistry};

/// Top-level plan file as read from TOML, before validation.
///
/// ```toml
/// [session]
/// root = ".sessiondag/sessions"
/// title = "laptop certification"
///
/// [checkpoint]
/// max_attempts = 5
///
/// [selection]
/// include = ["com.example::cpu/.*"]
///
/// [[provider]]
/// namespace = "com.example"
///
/// [[provider.unit]]
/// id = "cpuinfo"
/// plugin = "resource"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlanFile {
    #[serde(default)]
    pub session: SessionSection,

    #[serde(default)]
    pub checkpoint: CheckpointSection,

    #[serde(default)]
    pub selection: SelectionSection,

    /// All providers from `[[provider]]`, in file order.
    #[serde(default)]
    pub provider: Vec<ProviderConfig>,
}

/// A plan file that passed structural validation.
///
/// Only obtainable through `PlanFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct PlanFile {
    pub session: SessionSection,
    pub checkpoint: CheckpointSection,
    pub selection: SelectionSection,
    pub provider: Vec<ProviderConfig>,
}

impl PlanFile {
    pub(crate) fn new_unchecked(
        session: SessionSection,
        checkpoint: CheckpointSection,
        selection: SelectionSection,
        provider: Vec<ProviderConfig>,
    ) -> Self {
        Self {
            session,
            checkpoint,
            selection,
            provider,
        }
    }

    /// Register every provider of the plan, in file order.
    pub fn registry(&self) -> UnitRegistry {
        UnitRegistry::from_providers(
            self.provider
                .iter()
                .map(|p| Provider::new(p.namespace.trim(), p.unit.clone())),
        )
    }
}

/// `[session]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionSection {
    /// Checkpoint store root. Relative paths are taken from the working
    /// directory.
    #[serde(default = "default_session_root")]
    pub root: PathBuf,

    #[serde(default)]
    pub title: Option<String>,
}

fn default_session_root() -> PathBuf {
    PathBuf::from(".sessiondag/sessions")
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            root: default_session_root(),
            title: None,
        }
    }
}

/// `[checkpoint]` section: how hard to try before giving up on a write.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckpointSection {
    /// Total attempts per checkpoint, the first one included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_first_delay_ms")]
    pub first_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_factor")]
    pub factor: f64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_first_delay_ms() -> u64 {
    50
}

fn default_max_delay_ms() -> u64 {
    1000
}

fn default_factor() -> f64 {
    2.0
}

impl Default for CheckpointSection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            first_delay_ms: default_first_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            factor: default_factor(),
        }
    }
}

impl CheckpointSection {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: BackoffPolicy {
                first: Duration::from_millis(self.first_delay_ms),
                max: Duration::from_millis(self.max_delay_ms),
                factor: self.factor,
            },
        }
    }
}

/// `[selection]` section.
///
/// `include` / `exclude` are regular expressions matched against the whole
/// qualified job id.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SelectionSection {
    /// Jobs always run first, whatever the selection says.
    #[serde(default)]
    pub mandatory: Vec<String>,

    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

/// One `[[provider]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderConfig {
    /// Prefix used to qualify every partial id of this provider.
    pub namespace: String,

    #[serde(default)]
    pub unit: Vec<UnitConfig>,
}

/// Raw unit definition, fields kept textual the way unit files write them.
///
/// Conversion to a [`crate::unit::Unit`] happens in
/// [`crate::unit::unit_from_config`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitConfig {
    /// Partial id; qualified with the provider namespace.
    pub id: String,

    #[serde(default = "default_plugin")]
    pub plugin: String,

    /// Whitespace/comma separated word list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salvages: Option<String>,

    /// One expression per entry; an entry may also hold several lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,

    /// `from <namespace> import <partial> [as <alias>]`, one per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imports: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environ: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<f64>,
}

fn default_plugin() -> String {
    "shell".to_string()
}
