//! Bounded retry with exponential backoff for RPC calls

use std::{future::Future, time::Duration};

use tracing::warn;

use crate::{
    constants::{DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_RETRIES, MAX_BACKOFF_MS},
    errors::ScriptError,
};

/// How many times, and how patiently, a failing RPC call is retried.
///
/// Only transient errors (see [`ScriptError::is_transient`]) are retried.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// The total number of attempts, including the first
    pub max_attempts: u32,
    /// The delay after the first failed attempt
    pub initial_backoff: Duration,
    /// The upper bound on any single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// A policy with the given attempt bound and initial backoff
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            ..Default::default()
        }
    }

    /// A policy that makes a single attempt
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// The delay to sleep after failed attempt number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// attempt bound is reached.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, ScriptError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ScriptError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(val) => return Ok(val),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}, retrying in {:?}",
                        what, attempt, max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
