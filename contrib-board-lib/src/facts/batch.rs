//! Batched execution of remote calls with per-item retry.
//!
//! Items are split into fixed-size batches. Batches run strictly one after another with a
//! pause in between; the items of one batch run concurrently on the calling task and all of
//! them settle before the next batch starts. Each item is retried with exponential backoff,
//! and an item that runs out of retries is dropped from the results instead of failing the
//! whole run.

use super::client::RemoteError;
use super::pipeline_config::PipelineConfig;
use super::throttler::Throttler;
use chrono::Utc;
use core::time::Duration;
use futures_util::future::join_all;
use std::sync::Arc;

const LOG_TARGET: &str = "     batch";

/// Retry and pacing parameters for a [`BatchExecutor`]
#[derive(Debug, Clone, Copy)]
pub struct BatchPolicy {
    /// Items per batch
    pub batch_size: usize,

    /// Retries on top of the first attempt
    pub retry_attempts: u32,

    /// Base delay for backoff, also used as the pause between batches
    pub rate_limit_delay: Duration,

    /// Upper bound on how long a rate-limit response may hold back other requests
    pub max_rate_limit_wait: Duration,
}

impl BatchPolicy {
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            retry_attempts: config.retry_attempts,
            rate_limit_delay: config.rate_limit_delay,
            max_rate_limit_wait: config.max_rate_limit_wait,
        }
    }

    /// Delay before retry number `retry` (1-based): `rate_limit_delay × 2^retry`.
    #[must_use]
    pub fn retry_delay(&self, retry: u32) -> Duration {
        self.rate_limit_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

/// Result of one attempt at an item
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    /// The call succeeded.
    Success(T),

    /// The call failed but another attempt is allowed after `delay`.
    Retry { error: RemoteError, delay: Duration },

    /// The call failed and no attempts remain.
    Exhausted(RemoteError),
}

/// Final state of an item after all of its attempts
#[derive(Debug)]
pub enum ItemOutcome<T> {
    Completed(T),
    Dropped { error: RemoteError, attempts: u32 },
}

/// What a [`BatchExecutor::run`] call produced
#[derive(Debug)]
pub struct BatchReport<T> {
    /// Successful results, batch order preserved, order within a batch unspecified
    pub results: Vec<T>,

    /// Number of items dropped after exhausting their retries
    pub dropped: usize,

    /// Number of batches executed
    pub batches: usize,
}

impl<T> BatchReport<T> {
    const fn empty() -> Self {
        Self {
            results: Vec::new(),
            dropped: 0,
            batches: 0,
        }
    }
}

/// Runs fallible remote calls in sequential batches of concurrent items
#[derive(Debug, Clone)]
pub struct BatchExecutor {
    policy: BatchPolicy,
    throttler: Arc<Throttler>,
}

impl BatchExecutor {
    #[must_use]
    pub const fn new(policy: BatchPolicy, throttler: Arc<Throttler>) -> Self {
        Self { policy, throttler }
    }

    /// Issue a single call outside of any batch, under the same throttling as batched items.
    ///
    /// The call waits out an active rate-limit pause before it is sent, and a rate-limited
    /// failure pauses the shared throttler for everyone else. No retry is attempted.
    pub async fn run_once<T, F, Fut>(&self, op: F) -> Result<T, RemoteError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let result = {
            let _permit = self.throttler.acquire().await;
            op().await
        };

        if let Err(error) = &result {
            self.hold_for_rate_limit(error);
        }
        result
    }

    /// Apply `op` to every item and collect the successful results.
    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, op: F) -> BatchReport<T>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        if items.is_empty() {
            return BatchReport::empty();
        }

        let batch_size = self.policy.batch_size.max(1);
        let batch_count = items.len().div_ceil(batch_size);
        let mut report = BatchReport {
            results: Vec::with_capacity(items.len()),
            ..BatchReport::empty()
        };

        log::debug!(target: LOG_TARGET, "Processing {} item(s) in {batch_count} batch(es)", items.len());

        for (index, batch) in items.chunks(batch_size).enumerate() {
            log::debug!(target: LOG_TARGET, "Processing batch {}/{batch_count} ({} item(s))", index + 1, batch.len());

            let outcomes = join_all(batch.iter().map(|item| self.run_item(item, &op))).await;
            report.batches += 1;

            for outcome in outcomes {
                match outcome {
                    ItemOutcome::Completed(value) => report.results.push(value),
                    ItemOutcome::Dropped { error, attempts } => {
                        log::warn!(target: LOG_TARGET, "Giving up on a request after {attempts} attempt(s): {error}");
                        report.dropped += 1;
                    }
                }
            }

            if index + 1 < batch_count {
                tokio::time::sleep(self.policy.rate_limit_delay).await;
            }
        }

        report
    }

    async fn run_item<I, T, F, Fut>(&self, item: &I, op: &F) -> ItemOutcome<T>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut attempts = 0;

        loop {
            let result = {
                let _permit = self.throttler.acquire().await;
                op(item.clone()).await
            };
            attempts += 1;

            match self.assess(result, attempts) {
                AttemptOutcome::Success(value) => return ItemOutcome::Completed(value),
                AttemptOutcome::Retry { error, delay } => {
                    log::debug!(
                        target: LOG_TARGET,
                        "Retrying request (attempt {}, delay {}ms): {error}",
                        attempts + 1,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                AttemptOutcome::Exhausted(error) => return ItemOutcome::Dropped { error, attempts },
            }
        }
    }

    /// Classify the result of attempt number `attempts` (1-based).
    fn assess<T>(&self, result: Result<T, RemoteError>, attempts: u32) -> AttemptOutcome<T> {
        let error = match result {
            Ok(value) => return AttemptOutcome::Success(value),
            Err(error) => error,
        };

        if attempts > self.policy.retry_attempts {
            return AttemptOutcome::Exhausted(error);
        }

        self.hold_for_rate_limit(&error);

        AttemptOutcome::Retry {
            error,
            delay: self.policy.retry_delay(attempts),
        }
    }

    /// Pause the shared throttler until the rate limit resets, capped at `max_rate_limit_wait`.
    fn hold_for_rate_limit(&self, error: &RemoteError) {
        let RemoteError::RateLimited { reset_at: Some(reset_at), .. } = error else {
            return;
        };

        let wait = (*reset_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO)
            .min(self.policy.max_rate_limit_wait);

        if !wait.is_zero() && self.throttler.pause_for(wait) {
            log::warn!(
                target: LOG_TARGET,
                "Hit GitHub rate limit, holding requests until {}",
                reset_at.with_timezone(&chrono::Local).format("%T")
            );
        }
    }
}
