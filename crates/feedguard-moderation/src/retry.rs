//! Retry policy for remote model calls
//!
//! Exponential backoff (`base * factor^attempt`, capped) around a fallible
//! async operation. The outcome is a tagged value rather than an error so
//! callers can degrade to rules-only classification on exhaustion.

use feedguard_core::{Error, ModerationConfig, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Upper bound on a single backoff sleep
pub const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub backoff_base: Duration,
    /// Multiplier applied per attempt
    pub backoff_factor: f64,
    /// Maximum delay between attempts
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(800),
            backoff_factor: 2.0,
            max_delay: MAX_BACKOFF,
        }
    }
}

/// How a retried operation ended
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Success { value: T, attempts: u32 },
    Exhausted { last_error: Option<Error>, attempts: u32 },
}

impl<T> RetryOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

impl RetryPolicy {
    /// Build the policy from moderation settings
    pub fn from_config(config: &ModerationConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            backoff_base: config.backoff_base,
            backoff_factor: config.backoff_factor,
            max_delay: MAX_BACKOFF,
        }
    }

    /// Set maximum attempts
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay to wait after the given zero-based failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.backoff_base.as_secs_f64() * self.backoff_factor.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent.
    ///
    /// `on_failure` runs after every failed attempt, before any backoff.
    /// No sleep follows the final attempt.
    pub async fn run<T, F, Fut, H>(&self, mut operation: F, mut on_failure: H) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
        H: FnMut(&Error, u32),
    {
        let mut last_error = None;
        let mut attempts = 0;

        for attempt in 0..self.max_attempts {
            attempts = attempt + 1;
            match operation(attempt).await {
                Ok(value) => return RetryOutcome::Success { value, attempts },
                Err(error) => {
                    on_failure(&error, attempt);
                    let retryable = error.is_retryable();
                    last_error = Some(error);

                    if !retryable || attempts == self.max_attempts {
                        break;
                    }

                    let delay = self.delay_for(attempt);
                    debug!(attempt = attempts, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                    sleep(delay).await;
                }
            }
        }

        RetryOutcome::Exhausted { last_error, attempts }
    }
}
