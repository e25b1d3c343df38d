//! Retry logic for JSON-RPC requests.
//!
//! Only transport-level failures are retried. A node answering with a JSON-RPC
//! error (an execution revert, a nonce problem) is a final answer and is
//! returned to the caller on the first attempt.

use crate::config::ChainConfig;
use crate::error::{GovernanceError, Result, RetryContext};
use backoff::{backoff::Backoff, ExponentialBackoff};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Status prefixes the RPC client puts on HTTP-level failures worth retrying
const TRANSIENT_HTTP_STATUSES: [&str; 4] = ["HTTP 500", "HTTP 502", "HTTP 503", "HTTP 504"];

/// Exponential backoff settings for RPC requests
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// First backoff delay
    pub initial_delay: Duration,
    /// Upper bound for a single delay
    pub max_delay: Duration,
    /// Growth factor between delays
    pub multiplier: f64,
}

impl RetryStrategy {
    /// Take the retry settings of a chain config
    pub fn from_config(config: &ChainConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.retry_initial_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            multiplier: config.retry_multiplier,
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_delay,
            current_interval: self.initial_delay,
            max_interval: self.max_delay,
            multiplier: self.multiplier,
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        }
    }

    /// Whether `error` is worth another attempt
    pub fn is_retryable(error: &GovernanceError) -> bool {
        match error {
            GovernanceError::NetworkError(_)
            | GovernanceError::RateLimitExceeded(_)
            | GovernanceError::InvalidResponse(_) => true,
            GovernanceError::RpcError(msg) => TRANSIENT_HTTP_STATUSES
                .iter()
                .any(|status| msg.starts_with(status)),
            _ => false,
        }
    }

    // A node's Retry-After wins over a shorter backoff delay
    fn next_delay(error: &GovernanceError, backoff: &mut ExponentialBackoff) -> Option<Duration> {
        let delay = backoff.next_backoff()?;
        match error {
            GovernanceError::RateLimitExceeded(secs) => {
                Some(delay.max(Duration::from_secs(*secs)))
            }
            _ => Some(delay),
        }
    }

    /// Run `operation` until it succeeds, fails permanently or runs out of retries
    ///
    /// `label` names the operation in log lines, usually the RPC method.
    pub async fn retry<F, Fut, T>(&self, label: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut backoff = self.backoff();
        let mut ctx = RetryContext::new();

        loop {
            let error = match operation().await {
                Ok(value) => {
                    if ctx.attempts > 0 {
                        debug!(
                            "{} succeeded after {} retries ({} ms backoff)",
                            label, ctx.attempts, ctx.total_time_ms
                        );
                    }
                    return Ok(value);
                }
                Err(error) if Self::is_retryable(&error) => error,
                Err(error) => return Err(error),
            };

            if ctx.attempts >= self.max_retries {
                warn!(
                    "{} gave up after {} retries, last error: {}",
                    label, ctx.attempts, error
                );
                return Err(GovernanceError::MaxRetriesExceeded(self.max_retries));
            }

            let Some(delay) = Self::next_delay(&error, &mut backoff) else {
                return Err(GovernanceError::MaxRetriesExceeded(self.max_retries));
            };
            ctx.record_attempt(&error.to_string(), delay.as_millis() as u64);

            warn!(
                "{} failed: {}. Retry {}/{} in {:?}",
                label, error, ctx.attempts, self.max_retries, delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}
