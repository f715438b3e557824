//! Retry policy for read timeouts.
//!
//! Only read timeouts are retried. Every other failure is either reported as
//! a [`TransferOutcome`](super::TransferOutcome) or propagated as a fatal
//! [`DownloadError`](super::DownloadError).
//!
//! # Delay Calculation
//!
//! Attempts are 1-indexed. After attempt `n` times out, attempt `n + 1` runs
//! after sleeping `(n + 1)^3 * backoff_unit`:
//!
//! ```text
//! attempt:  2   3   4   5
//! delay:    8  27  64 125   (x backoff_unit)
//! ```
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use stream_saver::download::{RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::new(5, Duration::from_secs(1));
//! match policy.after_timeout(1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(attempt, 2);
//!         assert_eq!(delay, Duration::from_secs(8));
//!     }
//!     RetryDecision::GiveUp { .. } => unreachable!(),
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

use super::constants::{DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_ATTEMPTS};

/// Decision on whether to retry after a read timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the transfer after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (first retry is attempt 2).
        attempt: u32,
    },

    /// Stop retrying and surface the timeout.
    GiveUp {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Attempt limit and cubic backoff for read-timeout retries.
///
/// # Default Values
///
/// - `max_attempts`: 5
/// - `backoff_unit`: 1 second
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Multiplied by `attempt^3` to get the delay.
    backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy. `max_attempts` below 1 is raised to 1.
    #[must_use]
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the configured backoff unit.
    #[must_use]
    pub fn backoff_unit(&self) -> Duration {
        self.backoff_unit
    }

    /// Decides what happens after attempt `failed_attempt` (1-indexed) timed out.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn after_timeout(&self, failed_attempt: u32) -> RetryDecision {
        let next_attempt = failed_attempt.saturating_add(1);

        if next_attempt > self.max_attempts {
            debug!(failed_attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::GiveUp {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.delay_for(next_attempt);
        debug!(
            next_attempt,
            delay_ms = delay.as_millis(),
            "will retry after read timeout"
        );

        RetryDecision::Retry {
            delay,
            attempt: next_attempt,
        }
    }

    /// Delay slept before running `attempt`: `attempt^3 * backoff_unit`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(attempt.saturating_pow(3))
    }
}
