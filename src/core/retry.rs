// bounded retry with exponential backoff for llm calls

use std::future::Future;
use std::time::Duration;

use crate::Error;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first one included. Never below 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            ..Self::default()
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < attempts && e.is_retryable() => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{label} failed (attempt {attempt}/{attempts}), retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
