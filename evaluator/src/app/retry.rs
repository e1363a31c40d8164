//! Retry with exponential backoff
//!
//! Re-invokes a fallible async operation until it succeeds, the policy
//! rejects the error, or the attempt budget is spent.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::error::TransportError;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (not including the initial attempt)
    pub max_attempts: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Upper bound for any single delay
    pub max_delay: Duration,

    pub backoff_multiplier: f64,

    /// Add ±10% random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// No waiting between attempts
    #[cfg(test)]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }
}

/// Decides whether an error is worth another attempt
pub trait RetryPolicy<E> {
    fn should_retry(&self, error: &E) -> bool;
}

/// Retries I/O level transport faults only
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientTransportPolicy;

impl RetryPolicy<TransportError> for TransientTransportPolicy {
    fn should_retry(&self, error: &TransportError) -> bool {
        error.is_transient()
    }
}

/// Final failure of a retried operation
#[derive(Debug)]
pub struct RetryFailure<E> {
    /// Total attempts made, including the first
    pub attempts: u32,
    pub error: E,
}

/// Executes operations under a `RetryConfig`
#[derive(Debug, Clone, Default)]
pub struct Retrier {
    config: RetryConfig,
}

impl Retrier {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Run `operation` until it succeeds or the policy/budget stops it
    pub async fn call<F, Fut, T, E, P>(&self, mut operation: F, policy: &P) -> Result<T, RetryFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        P: RetryPolicy<E>,
    {
        let mut delay = self.config.initial_delay.min(self.config.max_delay);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if attempt > self.config.max_attempts || !policy.should_retry(&error) {
                        return Err(RetryFailure {
                            attempts: attempt,
                            error,
                        });
                    }

                    let wait = if self.config.jitter {
                        add_jitter(delay)
                    } else {
                        delay
                    };
                    tracing::debug!(
                        "Attempt {} failed ({}), retrying in {:?}",
                        attempt,
                        error,
                        wait
                    );
                    if !wait.is_zero() {
                        sleep(wait).await;
                    }

                    delay = next_delay(delay, &self.config);
                }
            }
        }
    }
}

fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    let scaled = delay.as_secs_f64() * config.backoff_multiplier;
    if !scaled.is_finite() || scaled >= config.max_delay.as_secs_f64() {
        config.max_delay
    } else {
        Duration::from_secs_f64(scaled.max(0.0))
    }
}

fn add_jitter(delay: Duration) -> Duration {
    let range = delay.as_millis() as f64 * 0.1;
    if range <= 0.0 {
        return delay;
    }
    let jitter: f64 = rand::thread_rng().gen_range(-range..=range);
    Duration::from_millis((delay.as_millis() as f64 + jitter).max(0.0) as u64)
}
