//! Retry strategies for remote calls (database queries, external APIs).
//!
//! Two strategies coexist because their call sites depend on different
//! semantics:
//!
//! - [`ClassifiedBackoffRetry`] retries only errors whose message looks like
//!   rate limiting, with capped exponential backoff plus jitter. Anything
//!   else is returned on the first failure.
//! - [`UnconditionalBackoffRetry`] retries every error with a doubling delay
//!   and no jitter. Used for raw database access where each attempt opens a
//!   fresh connection.
//!
//! Neither strategy deduplicates work: the operation may run several times,
//! so callers must only wrap operations that are safe to repeat.

use std::fmt::{self, Display};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(300);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(3000);
pub const DEFAULT_FACTOR: f64 = 2.0;

/// Upper bound of the random jitter, as a fraction of the current delay.
pub const JITTER_FRACTION: f64 = 0.1;

/// Error message fragments that mark a failure as transient rate limiting.
///
/// `Unexpected token 'T'` is what a "Too Many Requests" HTML page produces
/// when parsed as JSON.
const RETRYABLE_MARKERS: [&str; 4] = ["Too Many", "429", "rate limit", "Unexpected token 'T'"];

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Observer invoked before each retry with the error message and the
/// 1-based number of the attempt that just failed.
pub type RetryObserver = Arc<dyn Fn(&str, u32) + Send + Sync>;

/// Tunable parameters for [`ClassifiedBackoffRetry`].
#[derive(Clone)]
pub struct RetryPolicy {
    /// Maximum number of times the operation is invoked.
    pub max_retries: u32,
    /// Starting delay; grown by `factor` before the first sleep.
    pub initial_delay: Duration,
    /// Ceiling for the grown delay (jitter is added on top).
    pub max_delay: Duration,
    /// Multiplicative growth per retry.
    pub factor: f64,
    pub on_retry: Option<RetryObserver>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            factor: DEFAULT_FACTOR,
            on_retry: None,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("factor", &self.factor)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl RetryPolicy {
    /// Attach a retry observer.
    pub fn with_observer(mut self, observer: RetryObserver) -> Self {
        self.on_retry = Some(observer);
        self
    }
}

/// Whether an error message indicates rate limiting or throttling.
pub fn is_retryable(message: &str) -> bool {
    RETRYABLE_MARKERS.iter().any(|marker| message.contains(marker))
}

/// Calculate the next backoff delay from the current delay and policy.
///
/// The result is clamped to [`RetryPolicy::max_delay`]; a product too large
/// to represent also clamps.
pub fn next_delay(current: Duration, policy: &RetryPolicy) -> Duration {
    Duration::try_from_secs_f64(current.as_secs_f64() * policy.factor)
        .map_or(policy.max_delay, |next| next.min(policy.max_delay))
}

/// Random jitter in `[0, JITTER_FRACTION * delay)`.
pub fn jitter(delay: Duration) -> Duration {
    let max_secs = delay.as_secs_f64() * JITTER_FRACTION;
    if max_secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(rand::rng().random_range(0.0..max_secs))
}

// ---------------------------------------------------------------------------
// ClassifiedBackoffRetry
// ---------------------------------------------------------------------------

/// Retries rate-limit failures with capped exponential backoff and jitter.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedBackoffRetry {
    policy: RetryPolicy,
}

impl ClassifiedBackoffRetry {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or has
    /// been invoked `max_retries` times. The error returned is always the
    /// one produced by the last invocation.
    pub async fn run<F, Fut, T, E>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let policy = &self.policy;
        let mut attempt = 0u32;
        let mut delay = policy.initial_delay;

        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            attempt += 1;
            if attempt >= policy.max_retries {
                tracing::warn!(attempt, error = %err, "Remote call failed after all retries");
                return Err(err);
            }

            let message = err.to_string();
            if !is_retryable(&message) {
                return Err(err);
            }

            if let Some(observer) = &policy.on_retry {
                observer(&message, attempt);
            }

            delay = next_delay(delay, policy);
            let wait = delay + jitter(delay);
            tracing::warn!(
                attempt,
                delay_ms = wait.as_millis() as u64,
                error = %message,
                "Remote call rate limited, backing off",
            );
            tokio::time::sleep(wait).await;
        }
    }
}

/// Run `op` under [`ClassifiedBackoffRetry`] with the given policy.
pub async fn retry_with_backoff<F, Fut, T, E>(op: F, policy: &RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    ClassifiedBackoffRetry::new(policy.clone()).run(op).await
}

// ---------------------------------------------------------------------------
// UnconditionalBackoffRetry
// ---------------------------------------------------------------------------

/// Retries every failure, doubling the delay after each attempt. No jitter.
#[derive(Debug, Clone, Copy)]
pub struct UnconditionalBackoffRetry {
    /// Total number of invocations; zero is treated as one.
    pub attempts: u32,
    /// Sleep after the first failure.
    pub initial_delay: Duration,
}

impl UnconditionalBackoffRetry {
    pub fn new(attempts: u32, initial_delay: Duration) -> Self {
        Self {
            attempts,
            initial_delay,
        }
    }

    pub async fn run<F, Fut, T, E>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.attempts.max(1);
        let mut delay = self.initial_delay;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= attempts => {
                    tracing::error!(attempt, error = %err, "Query failed after all retries");
                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Query attempt failed, retrying",
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
