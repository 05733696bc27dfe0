//! Retry with exponential backoff for transient stage failures.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use civitdl_core::{FetchError, Stage, TransferError};

/// Errors that can tell whether another attempt is worthwhile.
pub trait Retryable {
    /// Whether a retry may succeed.
    fn is_retryable(&self) -> bool;
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        FetchError::is_retryable(self)
    }
}

impl Retryable for TransferError {
    fn is_retryable(&self) -> bool {
        TransferError::is_retryable(self)
    }
}

/// Retry budget and backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): `base * 2^(retry - 1)`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails permanently, runs out of retries or
    /// the batch is cancelled.
    ///
    /// `op` receives the attempt number (0 for the first try) and the error
    /// of the previous attempt. On give-up the last error is returned.
    pub async fn run<T, E, F, Fut>(
        &self,
        stage: Stage,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut(u32, Option<&E>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        let mut last: Option<E> = None;
        loop {
            let err = match op(attempt, last.as_ref()).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() || attempt >= self.max_retries || cancel.is_cancelled() {
                return Err(err);
            }

            attempt += 1;
            let delay = self.delay_for(attempt);
            tracing::warn!(
                %stage,
                attempt,
                max_retries = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "Retrying after transient failure"
            );

            let cancelled = tokio::select! {
                () = cancel.cancelled() => true,
                () = tokio::time::sleep(delay) => false,
            };
            if cancelled {
                return Err(err);
            }
            last = Some(err);
        }
    }
}
