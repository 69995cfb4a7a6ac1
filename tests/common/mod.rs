#![allow(dead_code)]

pub use sessiondag_test_utils::builders;
pub use sessiondag_test_utils::{init_tracing, record, with_timeout};

use std::sync::Arc;

use sessiondag::checkpoint::{CheckpointStore, RetryPolicy};
use sessiondag::fs::mock::MockFileSystem;
use sessiondag::session::{SessionMetadata, SessionState};
use sessiondag::types::JobId;
use sessiondag::unit::Unit;

/// Owned job ids from string literals.
pub fn ids(list: &[&str]) -> Vec<JobId> {
    list.iter().map(|s| s.to_string()).collect()
}

/// A session over `units` with `desired` already planned.
pub fn planned_session(units: Vec<Unit>, desired: &[&str]) -> SessionState {
    let mut state = SessionState::new(units, SessionMetadata::new(Some("test".to_string())));
    state.update_desired_job_list(&ids(desired));
    state
}

/// A checkpoint store backed by an in-memory filesystem.
pub fn mock_store() -> (CheckpointStore, MockFileSystem) {
    let fs = MockFileSystem::new();
    let store = CheckpointStore::new("/sessions", Arc::new(fs.clone()));
    (store, fs)
}

/// Retry policy that never sleeps.
pub fn no_delay(attempts: u32) -> RetryPolicy {
    RetryPolicy::immediate(attempts)
}
