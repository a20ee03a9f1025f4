//! Retry policy for transient request failures
//!
//! The policy is a plain value: given how many retries were already spent
//! and the outcome of the latest attempt, it decides whether to accept the
//! response, wait and retry, or give up. [`execute_with_retry`] drives a
//! transport with it.
//!
//! # Backoff schedule
//!
//! | Retry | Wait |
//! |-------|------|
//! | 1st | immediately |
//! | n-th (n >= 2) | `factor * 2^(n-1)` seconds, capped |
//!
//! A `Retry-After` header on a retryable response replaces the computed
//! wait for that retry (still capped). The factor is drawn once when the
//! policy is built, so every retry in a run grows at the same rate.

use crate::config::FetcherConfig;
use crate::fetcher::observer::AttemptObserver;
use crate::fetcher::transport::{RawResponse, Transport, TransportError};
use crate::FetchError;
use rand::Rng;
use std::time::Duration;
use url::Url;

/// Statuses treated as transient: 429 and the gateway/server 5xx family
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// What to do after an attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryDecision {
    /// The response is final; hand it to the caller
    Accept,
    /// Wait for the given delay, then try again
    Retry(Duration),
    /// Transient failure, but the retry budget is spent
    Exhausted,
    /// Non-retryable failure
    Fail,
}

/// Bounded retry policy with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    retryable_statuses: Vec<u16>,
    backoff_factor: f64,
    max_backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy with a fixed backoff factor
    pub fn new(max_retries: u32, backoff_factor: f64, max_backoff: Duration) -> Self {
        Self {
            max_retries,
            retryable_statuses: RETRYABLE_STATUSES.to_vec(),
            backoff_factor: backoff_factor.max(0.0),
            max_backoff,
        }
    }

    /// Creates a policy whose backoff factor is drawn uniformly from `range`
    ///
    /// The draw happens here, once; the resulting policy is deterministic.
    pub fn with_random_factor<R: Rng>(
        max_retries: u32,
        range: (f64, f64),
        max_backoff: Duration,
        rng: &mut R,
    ) -> Self {
        let (low, high) = range;
        let factor = if low < high {
            rng.gen_range(low..=high)
        } else {
            low
        };
        Self::new(max_retries, factor, max_backoff)
    }

    /// Builds the policy for one run from the fetcher settings
    pub fn from_config(config: &FetcherConfig) -> Self {
        let policy = Self::with_random_factor(
            config.retries,
            (config.backoff_min, config.backoff_max),
            Duration::from_secs(config.max_backoff_secs),
            &mut rand::thread_rng(),
        );
        tracing::debug!(
            "Retry policy: {} retries, backoff factor {:.2}",
            policy.max_retries,
            policy.backoff_factor
        );
        policy
    }

    /// Replaces the set of statuses considered transient
    pub fn with_statuses(mut self, statuses: &[u16]) -> Self {
        self.retryable_statuses = statuses.to_vec();
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Wait before the given retry (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry <= 1 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let secs = self.backoff_factor * 2f64.powi(exponent);
        let capped = secs.min(self.max_backoff.as_secs_f64()).max(0.0);
        Duration::from_secs_f64(capped)
    }

    /// Decides the next step after an attempt
    ///
    /// # Arguments
    ///
    /// * `retries_done` - Retries already spent before this attempt
    /// * `outcome` - Result of the attempt
    pub fn decide(
        &self,
        retries_done: u32,
        outcome: Result<&RawResponse, &TransportError>,
    ) -> RetryDecision {
        match outcome {
            Ok(response) if self.is_retryable_status(response.status) => {
                self.retry_or_exhaust(retries_done, response.retry_after)
            }
            Ok(_) => RetryDecision::Accept,
            Err(error) if error.is_retryable() => self.retry_or_exhaust(retries_done, None),
            Err(_) => RetryDecision::Fail,
        }
    }

    fn retry_or_exhaust(&self, retries_done: u32, retry_after: Option<Duration>) -> RetryDecision {
        if retries_done >= self.max_retries {
            return RetryDecision::Exhausted;
        }

        let delay = match retry_after {
            Some(requested) => requested.min(self.max_backoff),
            None => self.backoff(retries_done + 1),
        };
        RetryDecision::Retry(delay)
    }
}

/// Performs a GET through `transport`, retrying per `policy`
///
/// Every attempt is reported to `observer`. Non-2xx responses that are not
/// retryable are returned as-is; the caller decides what they mean.
///
/// # Errors
///
/// * `FetchError::RetriesExhausted` - transient failures outlasted the budget
/// * `FetchError::RequestFailed` - a non-retryable connection-level error
pub async fn execute_with_retry(
    transport: &dyn Transport,
    policy: &RetryPolicy,
    observer: &dyn AttemptObserver,
    url: &Url,
) -> Result<RawResponse, FetchError> {
    let mut retries_done = 0;

    loop {
        let attempt = retries_done + 1;
        let outcome = transport.get(url).await;

        match &outcome {
            Ok(response) => observer.on_response(attempt, response.status, url.as_str()),
            Err(error) => observer.on_transport_error(attempt, url.as_str(), error),
        }

        match (policy.decide(retries_done, outcome.as_ref()), outcome) {
            (RetryDecision::Retry(delay), _) => {
                tracing::warn!(
                    "Retrying {} in {:?} (retry {}/{})",
                    url,
                    delay,
                    attempt,
                    policy.max_retries()
                );
                tokio::time::sleep(delay).await;
                retries_done += 1;
            }
            (RetryDecision::Exhausted, outcome) => {
                return Err(FetchError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last_status: outcome.ok().map(|r| r.status),
                });
            }
            (_, Ok(response)) => return Ok(response),
            (_, Err(error)) => {
                return Err(FetchError::RequestFailed {
                    url: url.to_string(),
                    status: None,
                    message: error.to_string(),
                });
            }
        }
    }
}
