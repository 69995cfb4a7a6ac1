// src/types.rs

//! Small shared vocabulary types: job ids, plugin kinds and outcomes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical (fully-qualified) job identifier, e.g. `com.example::cpu/scaling`.
pub type JobId = String;

/// Separator between a namespace and a partial job id.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// How a unit is executed by the (external) job runner.
///
/// The solver only cares about two of these: `Resource` jobs produce
/// resource records, and `Local` jobs produce further unit definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Plugin {
    Shell,
    Manual,
    Local,
    Resource,
    UserInteract,
    UserVerify,
}

impl Plugin {
    /// Whether the job runs without an operator in the loop.
    pub fn is_automated(self) -> bool {
        matches!(self, Plugin::Shell | Plugin::Local | Plugin::Resource)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plugin::Shell => "shell",
            Plugin::Manual => "manual",
            Plugin::Local => "local",
            Plugin::Resource => "resource",
            Plugin::UserInteract => "user-interact",
            Plugin::UserVerify => "user-verify",
        }
    }
}

impl fmt::Display for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plugin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shell" => Ok(Plugin::Shell),
            "manual" => Ok(Plugin::Manual),
            "local" => Ok(Plugin::Local),
            "resource" => Ok(Plugin::Resource),
            "user-interact" => Ok(Plugin::UserInteract),
            "user-verify" => Ok(Plugin::UserVerify),
            other => Err(format!(
                "invalid plugin: {other} (expected one of shell, manual, local, \
                 resource, user-interact, user-verify)"
            )),
        }
    }
}

/// Terminal outcome of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
    Crash,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Pass => "pass",
            Outcome::Fail => "fail",
            Outcome::Skip => "skip",
            Outcome::Crash => "crash",
        }
    }

    /// Outcomes that count as "the job failed" for salvage dependencies.
    pub fn is_failure(self) -> bool {
        matches!(self, Outcome::Fail | Outcome::Crash)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pass" => Ok(Outcome::Pass),
            "fail" => Ok(Outcome::Fail),
            "skip" => Ok(Outcome::Skip),
            "crash" => Ok(Outcome::Crash),
            other => Err(format!(
                "invalid outcome: {other} (expected pass, fail, skip or crash)"
            )),
        }
    }
}
