// src/session/metadata.rs

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The session has not been finished yet.
pub const FLAG_INCOMPLETE: &str = "incomplete";
/// The session is still running the jobs that discover the real plan.
pub const FLAG_BOOTSTRAPPING: &str = "bootstrapping";
/// Results have been handed off to whatever consumes them.
pub const FLAG_SUBMITTED: &str = "submitted";

/// Descriptive data about a session, persisted with every checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub flags: BTreeSet<String>,
}

impl SessionMetadata {
    /// Fresh metadata with a random id and the `incomplete` flag set.
    pub fn new(title: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            created_at: Utc::now(),
            flags: BTreeSet::from([FLAG_INCOMPLETE.to_string()]),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: &str) {
        self.flags.insert(flag.to_string());
    }

    pub fn clear_flag(&mut self, flag: &str) {
        self.flags.remove(flag);
    }
}
