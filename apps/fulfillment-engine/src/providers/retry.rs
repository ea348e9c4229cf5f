//! Retry driver for external provider calls.
//!
//! Each operation is invoked up to 3 times total with exponential backoff
//! (1 s, 2 s between attempts, doubling). Only transient failures retry;
//! signature, validation, and 4xx errors terminate immediately. A
//! cancelled caller aborts the in-flight wait and schedules no further
//! attempt. Per-provider metrics are recorded on every call.

use std::future::Future;
use std::time::Duration;

use metrics::counter;
use tokio_util::sync::CancellationToken;

use super::code::ProviderCode;
use super::ProviderError;

/// Retry policy for provider calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum invocations of the operation, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Backoff multiplier between attempts.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Backoff before attempt `next_attempt` (2-based): 1 s, 2 s, 4 s, …
    #[must_use]
    pub fn delay_before(&self, next_attempt: u32) -> Duration {
        let exp = next_attempt.saturating_sub(2);
        self.base_delay * self.multiplier.saturating_pow(exp)
    }
}

/// Run a provider operation under the retry policy.
///
/// `op` is called with the 1-based attempt number. The operation is never
/// invoked more than `policy.max_attempts` times.
///
/// # Errors
///
/// The last provider error when attempts are exhausted, the first
/// non-retryable error, or `Cancelled` when the token fires mid-backoff.
pub async fn with_retry<T, F, Fut>(
    provider: ProviderCode,
    operation: &'static str,
    policy: RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, ProviderError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let provider_label = provider.as_str();
    let mut attempt = 1;

    loop {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        counter!(
            "provider_calls_total",
            "provider" => provider_label,
            "operation" => operation,
        )
        .increment(1);

        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() || attempt >= policy.max_attempts {
                    counter!(
                        "provider_failures_total",
                        "provider" => provider_label,
                        "operation" => operation,
                    )
                    .increment(1);
                    return Err(err);
                }

                attempt += 1;
                let delay = policy.delay_before(attempt);
                tracing::warn!(
                    provider = provider_label,
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "provider call failed, retrying"
                );
                counter!(
                    "provider_retries_total",
                    "provider" => provider_label,
                    "operation" => operation,
                )
                .increment(1);

                tokio::select! {
                    () = cancel.cancelled() => return Err(ProviderError::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
