//! Retry for transient database failures
//!
//! Upserts are idempotent, so retrying a failed write is always safe.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Exponential backoff policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Run `f` until it succeeds, fails with a non-transient error, or the
/// policy runs out of attempts. `operation` names the call in logs.
pub async fn execute_with_retry<F, Fut, T>(policy: RetryPolicy, operation: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < policy.max_attempts && is_retriable_error(&e) => {
                let backoff = policy.backoff(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {:#}. Retrying in {}ms",
                    operation,
                    attempt,
                    policy.max_attempts,
                    e,
                    backoff.as_millis()
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Connection-level and serialization errors are worth another attempt;
/// constraint and syntax errors are not.
fn is_retriable_error(e: &anyhow::Error) -> bool {
    let err_str = format!("{:#}", e).to_lowercase();

    const TRANSIENT: &[&str] = &[
        "connection",
        "timeout",
        "timed out",
        "broken pipe",
        "pool closed",
        "could not serialize",
        "deadlock detected",
        "too many clients",
        "server closed the connection",
    ];

    TRANSIENT.iter().any(|needle| err_str.contains(needle))
}
