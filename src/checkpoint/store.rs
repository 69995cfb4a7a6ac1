// src/checkpoint/store.rs

//! On-disk layout:
//!
//! ```text
//! <root>/<session-id>/session.json        current checkpoint
//! <root>/<session-id>/session.json.tmp    in-flight write, renamed over the above
//! <root>/<session-id>/share/__result      optional outcome override for resume
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::checkpoint::CheckpointError;
use crate::checkpoint::resume::ResultOverride;
use crate::checkpoint::snapshot::{Snapshot, decode, encode};
use crate::fs::{FileSystem, RealFileSystem};

pub const CHECKPOINT_FILE: &str = "session.json";
pub const TEMP_CHECKPOINT_FILE: &str = "session.json.tmp";
pub const SHARE_DIR: &str = "share";
pub const OVERRIDE_FILE: &str = "__result";

/// Short description of a stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: String,
    pub title: Option<String>,
    pub saved_at: DateTime<Utc>,
    pub flags: BTreeSet<String>,
    pub jobs_total: usize,
    pub jobs_done: usize,
    pub running_job: Option<String>,
}

impl SessionSummary {
    fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            id: snapshot.session.id.clone(),
            title: snapshot.session.title.clone(),
            saved_at: snapshot.saved_at,
            flags: snapshot.session.flags.clone(),
            jobs_total: snapshot.run_list.len(),
            jobs_done: snapshot
                .run_list
                .iter()
                .filter(|id| snapshot.results.contains_key(*id))
                .count(),
            running_job: snapshot.running_job.clone(),
        }
    }
}

/// One entry of [`CheckpointStore::list`]. Unreadable checkpoints are
/// listed with the error that prevents loading them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionListing {
    pub id: String,
    pub summary: Result<SessionSummary, CheckpointError>,
}

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

fn valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\'])
}

impl CheckpointStore {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }

    /// A store backed by the real filesystem.
    pub fn on_disk(root: impl Into<PathBuf>) -> Self {
        Self::new(root, Arc::new(RealFileSystem))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id)
    }

    pub fn checkpoint_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(CHECKPOINT_FILE)
    }

    pub fn share_dir(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(SHARE_DIR)
    }

    pub fn override_path(&self, session_id: &str) -> PathBuf {
        self.share_dir(session_id).join(OVERRIDE_FILE)
    }

    fn checked(&self, session_id: &str) -> Result<(), CheckpointError> {
        if valid_session_id(session_id) {
            Ok(())
        } else {
            Err(CheckpointError::NotFound(session_id.to_string()))
        }
    }

    pub fn exists(&self, session_id: &str) -> bool {
        valid_session_id(session_id) && self.fs.exists(&self.checkpoint_path(session_id))
    }

    /// Write `snapshot` in one attempt.
    ///
    /// The new checkpoint becomes visible only through the final rename, so
    /// a reader sees either the previous checkpoint or the new one.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), CheckpointError> {
        let id = snapshot.session_id();
        self.checked(id)?;

        let bytes = encode(snapshot).map_err(|e| CheckpointError::io(id, e.into()))?;

        let dir = self.session_dir(id);
        let tmp = dir.join(TEMP_CHECKPOINT_FILE);
        let target = dir.join(CHECKPOINT_FILE);

        self.fs
            .create_dir_all(&self.share_dir(id))
            .map_err(|e| CheckpointError::io(id, e))?;
        self.fs
            .write(&tmp, &bytes)
            .map_err(|e| CheckpointError::io(id, e))?;
        self.fs
            .rename(&tmp, &target)
            .map_err(|e| CheckpointError::io(id, e))?;

        debug!(session = %id, bytes = bytes.len(), "checkpoint written");
        Ok(())
    }

    pub fn load(&self, session_id: &str) -> Result<Snapshot, CheckpointError> {
        self.checked(session_id)?;

        let path = self.checkpoint_path(session_id);
        if !self.fs.exists(&path) {
            return Err(CheckpointError::NotFound(session_id.to_string()));
        }

        let text = self
            .fs
            .read_to_string(&path)
            .map_err(|e| CheckpointError::io(session_id, e))?;
        decode(session_id, &text)
    }

    /// Every session directory under the root, sorted by id.
    pub fn list(&self) -> Result<Vec<SessionListing>, CheckpointError> {
        if !self.fs.is_dir(&self.root) {
            return Ok(Vec::new());
        }

        let root_label = self.root.display().to_string();
        let entries = self
            .fs
            .read_dir(&self.root)
            .map_err(|e| CheckpointError::io(&root_label, e))?;

        let mut listings: Vec<SessionListing> = entries
            .into_iter()
            .filter(|path| self.fs.is_dir(path))
            .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(String::from))
            .filter(|id| self.exists(id))
            .map(|id| {
                let summary = self
                    .load(&id)
                    .map(|snapshot| SessionSummary::from_snapshot(&snapshot));
                SessionListing { id, summary }
            })
            .collect();
        listings.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(listings)
    }

    /// Delete everything stored for `session_id`.
    pub fn discard(&self, session_id: &str) -> Result<(), CheckpointError> {
        self.checked(session_id)?;

        let dir = self.session_dir(session_id);
        if !self.fs.is_dir(&dir) {
            return Err(CheckpointError::NotFound(session_id.to_string()));
        }
        self.fs
            .remove_dir_all(&dir)
            .map_err(|e| CheckpointError::io(session_id, e))?;

        info!(session = %session_id, "session discarded");
        Ok(())
    }

    /// Read the resume override of `session_id`, if any.
    ///
    /// A file that cannot be parsed is reported as `Corrupt`.
    pub fn read_override(
        &self,
        session_id: &str,
    ) -> Result<Option<ResultOverride>, CheckpointError> {
        self.checked(session_id)?;

        let path = self.override_path(session_id);
        if !self.fs.exists(&path) {
            return Ok(None);
        }

        let text = self
            .fs
            .read_to_string(&path)
            .map_err(|e| CheckpointError::io(session_id, e))?;
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| CheckpointError::corrupt(session_id, format!("override file: {e}")))
    }

    pub fn write_override(
        &self,
        session_id: &str,
        result: &ResultOverride,
    ) -> Result<(), CheckpointError> {
        self.checked(session_id)?;

        let bytes =
            serde_json::to_vec_pretty(result).map_err(|e| CheckpointError::io(session_id, e.into()))?;
        self.fs
            .write(&self.override_path(session_id), &bytes)
            .map_err(|e| CheckpointError::io(session_id, e))
    }

    pub fn remove_override(&self, session_id: &str) -> Result<(), CheckpointError> {
        self.checked(session_id)?;

        let path = self.override_path(session_id);
        if !self.fs.exists(&path) {
            return Ok(());
        }
        self.fs
            .remove_file(&path)
            .map_err(|e| CheckpointError::io(session_id, e))
    }
}
