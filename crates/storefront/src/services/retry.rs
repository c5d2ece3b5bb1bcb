//! Exponential-backoff retry for transient network failures.
//!
//! Only failures where the request never got an answer are retried: connection
//! refused or reset, timeouts, and sockets closed mid-request. An upstream that
//! answered, even with a 5xx, is not retried.

use std::error::Error as StdError;
use std::fmt::Display;
use std::future::Future;

use tracing::warn;

use crate::config::RetryConfig;
use crate::services::upstream::UpstreamError;

/// Substrings identifying a transient failure anywhere in an error chain.
const TRANSIENT_MARKERS: &[&str] = &[
    "econnreset",
    "etimedout",
    "econnrefused",
    "socket hang up",
    "connection reset",
    "connection refused",
    "connection closed",
    "broken pipe",
    "timed out",
];

/// Errors that can say whether retrying might help.
pub trait Transient {
    /// Whether the failure is a transient network condition.
    fn is_transient(&self) -> bool;
}

impl Transient for UpstreamError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Transport { source, .. } => {
                source.is_timeout() || source.is_connect() || chain_is_transient(source)
            }
            _ => false,
        }
    }
}

/// Whether any error in the chain carries a transient marker.
#[must_use]
pub fn chain_is_transient(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        let text = err.to_string().to_lowercase();
        if TRANSIENT_MARKERS.iter().any(|marker| text.contains(marker)) {
            return true;
        }
        current = err.source();
    }
    false
}

/// Delay before retry number `attempt` (1-based): `initial * 2^(attempt - 1)`.
#[must_use]
pub fn retry_delay(policy: RetryConfig, attempt: u32) -> std::time::Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    policy.initial_delay.saturating_mul(factor)
}

/// Run `operation`, retrying transient failures with exponential backoff.
///
/// Makes at most `policy.max_retries + 1` attempts. Non-transient errors are
/// returned immediately.
///
/// # Errors
///
/// Returns the last error produced by `operation`.
pub async fn retry_transient<T, E, F, Fut>(
    policy: RetryConfig,
    operation: &str,
    mut call: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries && e.is_transient() => {
                attempt += 1;
                let delay = retry_delay(policy, attempt);
                warn!(
                    operation,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "Transient upstream failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
