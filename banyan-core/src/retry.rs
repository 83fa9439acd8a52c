//! Retry - Bounded retry over an error predicate
//!
//! The operation decides which failures are worth another attempt by
//! returning [`RetryError::Retryable`]; anything else stops immediately.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Outcome of a single attempt
#[derive(Debug)]
pub enum RetryError<E> {
    /// Transient failure; try again until the deadline
    Retryable(E),
    /// Permanent failure; give up now
    NonRetryable(E),
}

/// Delay between attempts
#[derive(Debug, Clone, Copy)]
pub enum Backoff {
    Fixed(Duration),
    /// Doubles after each attempt, capped at `max`
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(d) => d,
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.min(16));
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or `timeout` elapses
///
/// On timeout the last retryable error is returned. The operation always
/// runs at least once.
pub async fn retry<T, E, F, Fut>(timeout: Duration, backoff: Backoff, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
{
    let deadline = Instant::now() + timeout;
    let mut attempt = 0u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(RetryError::NonRetryable(e)) => return Err(e),
            Err(RetryError::Retryable(e)) => {
                let delay = backoff.delay(attempt);
                attempt = attempt.saturating_add(1);
                if Instant::now() + delay >= deadline {
                    return Err(e);
                }
                log::debug!("retrying after transient failure (attempt {})", attempt);
                tokio::time::sleep(delay).await;
            }
        }
    }
}
