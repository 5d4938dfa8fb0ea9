use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::ProviderError;

/// Exponential backoff policy for a single adapter call (spec §4.1:
/// "exponential backoff, default 3 attempts, base delay 1s, multiplier 2").
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn from_max_retries(max_retries: u32) -> Self {
        Self {
            max_attempts: max_retries.max(1),
            ..Self::default()
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt as i32);
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_secs_f64(self.base_delay.as_secs_f64() * factor * jitter)
    }
}

/// Runs `op` up to `policy.max_attempts` times, backing off between
/// attempts. Stops immediately on a non-retryable error.
pub async fn with_retries<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt + 1 < policy.max_attempts && err.retryable() => {
                tokio::time::sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
