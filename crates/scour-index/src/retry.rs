//! Bounded retry with linear backoff for destructive index operations.
//!
//! Each failure is classified with [`IndexError::failure_kind`]. Transient failures run the
//! caller's invalidation hook and retry, resource exhaustion retries once, anything else
//! stops immediately.

use std::{mem, thread, time::Duration};

use scour_config::IndexSettings;
use tracing::{debug, warn};

use crate::{FailureKind, IndexError};

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Invalidate readers and try again.
    Retry,
    /// Try again once over the whole run.
    RetryOnce,
    /// Give up and return the error.
    Stop,
}

impl FailurePolicy {
    /// Policy for a class of failure.
    pub fn for_kind(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Transient => Self::Retry,
            FailureKind::ResourceExhausted => Self::RetryOnce,
            FailureKind::Fatal => Self::Stop,
        }
    }
}

/// Attempt limit and backoff unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts made before giving up, at least one.
    pub max_attempts: u32,
    /// Wait after attempt `i` is `i` units.
    pub backoff_unit: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    /// Reads the policy from index settings.
    pub fn from_settings(settings: &IndexSettings) -> Self {
        Self::new(
            settings.max_retry_attempts,
            Duration::from_millis(settings.retry_backoff_ms),
        )
    }

    /// Wait after the given one-based attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&IndexSettings::default())
    }
}

/// Runs `work` until it succeeds or the policy gives up.
///
/// `work` receives the one-based attempt number. `on_transient` runs after every transient
/// failure, including the last one.
pub fn run_with_retry<T>(
    policy: &RetryPolicy,
    mut work: impl FnMut(u32) -> Result<T, IndexError>,
    mut on_transient: impl FnMut(&IndexError),
) -> Result<T, IndexError> {
    let mut retried_exhaustion = false;
    let mut attempt = 1;
    loop {
        let err = match work(attempt) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let retry = match FailurePolicy::for_kind(err.failure_kind()) {
            FailurePolicy::Retry => {
                on_transient(&err);
                true
            }
            FailurePolicy::RetryOnce => !mem::replace(&mut retried_exhaustion, true),
            FailurePolicy::Stop => false,
        };
        if !retry || attempt >= policy.max_attempts {
            warn!(attempt, error = %err, "index operation failed");
            return Err(err);
        }

        debug!(attempt, error = %err, "retrying index operation");
        thread::sleep(policy.backoff(attempt));
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    fn transient() -> IndexError {
        IndexError::Locked("held elsewhere".into())
    }

    #[test]
    fn transient_failures_retry_until_success() {
        let mut attempts = 0;
        let mut invalidations = 0;
        let result = run_with_retry(
            &policy(10),
            |attempt| {
                attempts = attempt;
                if attempt < 3 { Err(transient()) } else { Ok("done") }
            },
            |_| invalidations += 1,
        );
        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts, 3);
        assert!(invalidations >= 1);
    }

    #[test]
    fn fatal_failure_stops_after_one_attempt() {
        let mut attempts = 0;
        let mut invalidations = 0;
        let result: Result<(), _> = run_with_retry(
            &policy(10),
            |attempt| {
                attempts = attempt;
                Err(IndexError::Write("corrupt".into()))
            },
            |_| invalidations += 1,
        );
        assert!(matches!(result, Err(IndexError::Write(_))));
        assert_eq!(attempts, 1);
        assert_eq!(invalidations, 0);
    }

    #[test]
    fn exhaustion_retries_once() {
        let mut attempts = 0;
        let result: Result<(), _> = run_with_retry(
            &policy(10),
            |attempt| {
                attempts = attempt;
                Err(IndexError::Io(io::Error::new(io::ErrorKind::OutOfMemory, "oom")))
            },
            |_| {},
        );
        assert!(result.is_err());
        assert_eq!(attempts, 2);
    }

    #[test]
    fn attempts_are_bounded() {
        let mut attempts = 0;
        let result: Result<(), _> = run_with_retry(
            &policy(4),
            |attempt| {
                attempts = attempt;
                Err(transient())
            },
            |_| {},
        );
        assert!(matches!(result, Err(IndexError::Locked(_))));
        assert_eq!(attempts, 4);
    }

    #[test]
    fn backoff_grows_linearly() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(3), Duration::from_millis(300));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
