//! Bounded retry for transient write conflicts.
//!
//! Only errors that report themselves as [`Retryable`] are attempted again; caller errors
//! such as "not found" or "insufficient stock" are returned on the first attempt.

use std::{fmt::Display, future::Future, time::Duration};

use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Errors that can tell whether running the same operation again may succeed.
pub trait Retryable {
    /// True when the failure was a transient concurrent-write collision.
    fn is_retryable(&self) -> bool;
}

/// Retry limits for a single service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound for the doubled delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Run `attempt` until it succeeds, fails with a non-retryable error, or the policy's
/// attempts are exhausted.
///
/// # Errors
///
/// Returns the last error produced by `attempt`.
pub async fn retry_on_conflict<T, E, F, Fut>(
    policy: RetryPolicy,
    operation: &'static str,
    mut attempt: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt_number = 1;

    loop {
        match attempt().await {
            Ok(value) => {
                if attempt_number > 1 {
                    info!(operation, attempt = attempt_number, "succeeded after retry");
                }

                return Ok(value);
            }
            Err(error) if error.is_retryable() && attempt_number < max_attempts => {
                warn!(
                    operation,
                    attempt = attempt_number,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "write conflict, retrying"
                );

                sleep(delay).await;

                delay = (delay * 2).min(policy.max_delay);
                attempt_number += 1;
            }
            Err(error) => {
                debug!(operation, attempt = attempt_number, error = %error, "giving up");

                return Err(error);
            }
        }
    }
}
