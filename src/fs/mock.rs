// src/fs/mock.rs

//! In-memory [`FileSystem`] for tests, with write fault injection.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow, bail};

use super::FileSystem;

#[derive(Debug, Default)]
struct MockState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    /// Number of upcoming `write` calls that fail.
    failing_writes: usize,
    writes: usize,
}

impl MockState {
    fn ensure_dirs(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("mock filesystem lock poisoned"))
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        if let Ok(mut state) = self.lock() {
            if let Some(parent) = path.parent() {
                state.ensure_dirs(parent);
            }
            state.files.insert(path.to_path_buf(), content.into());
        }
    }

    /// Make the next `count` writes fail.
    pub fn fail_next_writes(&self, count: usize) {
        if let Ok(mut state) = self.lock() {
            state.failing_writes = count;
        }
    }

    /// Total number of `write` calls, failed ones included.
    pub fn write_count(&self) -> usize {
        self.lock().map(|s| s.writes).unwrap_or(0)
    }

    pub fn file_bytes(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.lock().ok()?.files.get(path.as_ref()).cloned()
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let state = self.lock()?;
        match state.files.get(path) {
            Some(content) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            None if state.dirs.contains(path) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut state = self.lock()?;
        state.writes += 1;
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            bail!("injected write failure: {:?}", path);
        }
        if let Some(parent) = path.parent() {
            state.ensure_dirs(parent);
        }
        state.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut state = self.lock()?;
        let content = state
            .files
            .remove(from)
            .ok_or_else(|| anyhow!("File not found: {:?}", from))?;
        if let Some(parent) = to.parent() {
            state.ensure_dirs(parent);
        }
        state.files.insert(to.to_path_buf(), content);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut state = self.lock()?;
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| anyhow!("File not found: {:?}", path))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.lock()?;
        if !state.dirs.contains(path) {
            bail!("Not a directory or not found: {:?}", path);
        }
        state.files.retain(|p, _| !p.starts_with(path));
        state.dirs.retain(|p| !p.starts_with(path));
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.lock()?.ensure_dirs(path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock()
            .map(|s| s.files.contains_key(path) || s.dirs.contains(path))
            .unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.lock().map(|s| s.dirs.contains(path)).unwrap_or(false)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.lock()?;
        if !state.dirs.contains(path) {
            bail!("Not a directory or not found: {:?}", path);
        }
        let children: BTreeSet<PathBuf> = state
            .files
            .keys()
            .chain(state.dirs.iter())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        Ok(children.into_iter().collect())
    }
}
