//! Shared retry loop for provider backends, gated on
//! [`crate::provider::ProviderError::is_retryable`].

use crate::provider::ProviderError;
use std::future::Future;
use std::time::Duration;

/// Run `attempt` until it succeeds, it fails with a non-retryable error, or
/// `max_retries` retries are exhausted. Backoff starts at `retry_delay` and
/// doubles after each retryable failure, unless the error itself carries a
/// `Retry-After` hint, in which case that wait is honored instead.
///
/// Authentication and configuration errors are never retryable (see
/// `is_retryable`), so they return on the first attempt.
pub async fn with_retries<T, F, Fut>(
    max_retries: u32,
    retry_delay: Duration,
    mut attempt: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut delay = retry_delay;
    let mut retries_used = 0;

    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if retries_used < max_retries && err.is_retryable() => {
                let wait = err.retry_after().unwrap_or(delay);
                tokio::time::sleep(wait).await;
                delay = delay.saturating_mul(2);
                retries_used += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
