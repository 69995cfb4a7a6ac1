// src/resource/record.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::JobId;

/// One flat key/value record emitted by a resource job.
pub type ResourceRecord = BTreeMap<String, String>;

/// Resource records keyed by the id of the job that produced them.
///
/// A job id that is absent means "has not produced data yet"; a job id
/// mapped to an empty list means "ran and produced nothing". Requirement
/// evaluation treats those two cases differently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceMap {
    records: BTreeMap<JobId, Vec<ResourceRecord>>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole record set of `job`.
    pub fn set(&mut self, job: impl Into<JobId>, records: Vec<ResourceRecord>) {
        self.records.insert(job.into(), records);
    }

    pub fn get(&self, job: &str) -> Option<&[ResourceRecord]> {
        self.records.get(job).map(Vec::as_slice)
    }

    pub fn contains(&self, job: &str) -> bool {
        self.records.contains_key(job)
    }

    pub fn remove(&mut self, job: &str) -> Option<Vec<ResourceRecord>> {
        self.records.remove(job)
    }

    pub fn job_ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ResourceRecord])> {
        self.records
            .iter()
            .map(|(id, records)| (id.as_str(), records.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse the stdout of a resource job into records.
///
/// Records are blocks of `key: value` lines separated by blank lines. A line
/// starting with whitespace continues the previous value. Lines without a
/// colon are ignored.
pub fn records_from_text(text: &str) -> Vec<ResourceRecord> {
    let mut records = Vec::new();
    let mut current = ResourceRecord::new();
    let mut last_key: Option<String> = None;

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                records.push(std::mem::take(&mut current));
            }
            last_key = None;
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            if let Some(value) = last_key.as_ref().and_then(|k| current.get_mut(k)) {
                value.push('\n');
                value.push_str(line.trim());
            }
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_string();
            current.insert(key.clone(), value.trim().to_string());
            last_key = Some(key);
        }
    }

    if !current.is_empty() {
        records.push(current);
    }

    records
}
