// src/checkpoint/retry.rs

//! Bounded retry of checkpoint writes.
//!
//! The delay before retry `n` (0-indexed) is `first × factor^n`, clamped
//! to `max`. Exhausting the attempts yields a [`CheckpointWarning`]: the
//! session goes on, but the caller learns that its last state is not on
//! disk.

use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::checkpoint::snapshot::Snapshot;
use crate::checkpoint::store::CheckpointStore;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplicative growth factor.
    pub factor: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            first: Duration::from_millis(50),
            max: Duration::from_secs(1),
            factor: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (0-indexed).
    pub fn next(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included.
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` attempts without any delay in between.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: BackoffPolicy {
                first: Duration::ZERO,
                max: Duration::ZERO,
                factor: 1.0,
            },
        }
    }
}

/// A checkpoint that could not be written. Not fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("checkpoint of session {session_id} not saved after {attempts} attempt(s): {last_error}")]
pub struct CheckpointWarning {
    pub session_id: String,
    pub attempts: u32,
    pub last_error: String,
}

/// Save `snapshot`, retrying per `policy`. Returns the number of attempts
/// used.
pub fn save_with_retry(
    store: &CheckpointStore,
    snapshot: &Snapshot,
    policy: &RetryPolicy,
) -> Result<u32, CheckpointWarning> {
    let attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 0..attempts {
        match store.save(snapshot) {
            Ok(()) => return Ok(attempt + 1),
            Err(err) => {
                last_error = err.to_string();
                if attempt + 1 < attempts {
                    let delay = policy.backoff.next(attempt);
                    warn!(
                        session = %snapshot.session_id(),
                        attempt = attempt + 1,
                        ?delay,
                        error = %last_error,
                        "checkpoint write failed; retrying"
                    );
                    thread::sleep(delay);
                }
            }
        }
    }

    let warning = CheckpointWarning {
        session_id: snapshot.session_id().to_string(),
        attempts,
        last_error,
    };
    warn!(%warning, "giving up on checkpoint");
    Err(warning)
}
