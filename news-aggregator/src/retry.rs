use backoff::{backoff::Backoff, exponential::ExponentialBackoff, SystemClock};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Upper bound for a single backoff delay.
const MAX_DELAY: Duration = Duration::from_secs(3600);

/// `retries` extra attempts after the first, waiting `base_delay * 2^i`
/// before retry `i`. No jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, base_delay: Duration) -> Self {
        Self { retries, base_delay }
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Fresh delay sequence for one retried operation.
    pub fn backoff(&self) -> ExponentialBackoff<SystemClock> {
        ExponentialBackoff {
            current_interval: self.base_delay,
            initial_interval: self.base_delay,
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: MAX_DELAY,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Run `operation` until it succeeds or the policy is exhausted. Every error
/// is retryable; the error of the final attempt is returned unchanged.
/// The closure receives the zero-based attempt number.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut backoff = policy.backoff();
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= policy.retries {
                    return Err(e);
                }

                let delay = backoff.next_backoff().unwrap_or(MAX_DELAY);
                warn!("Retrying after failure (attempt {}, delay {:?}): {}", attempt + 1, delay, e);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
