//! Submission retry with exponential backoff.
//!
//! Retries transient ledger failures within one execution attempt. Scale is
//! deliberately short: the transaction is already signed, so either the
//! ledger accepts it within a few seconds or the failure is surfaced and
//! the proposal stays retryable.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Attempts after the first failure.
const MAX_RETRIES: u32 = 3;

/// First backoff step.
const INITIAL_BACKOFF_MS: u64 = 100;

/// Backoff cap.
const MAX_BACKOFF_MS: u64 = 2_000;

/// Retry an operation while `is_retryable` holds, with doubling backoff.
///
/// Returns the first success, the first non-retryable error, or the last
/// error once retries are exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    is_retryable: fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !is_retryable(&err) || attempt >= MAX_RETRIES {
                    return Err(err);
                }

                let backoff_ms = (INITIAL_BACKOFF_MS << attempt).min(MAX_BACKOFF_MS);
                tracing::warn!(%err, attempt = attempt + 1, backoff_ms, "retrying after transient failure");
                sleep(Duration::from_millis(backoff_ms)).await;
                attempt += 1;
            }
        }
    }
}
