use tokio::time::{sleep, Duration};
use tracing::{error, warn};

use crate::config::types::RetryConfig;
use crate::error::Error;

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetrySettings {
    pub fn from_config(retry: &Option<RetryConfig>) -> Self {
        Self {
            attempts: retry
                .as_ref()
                .and_then(|r| r.attempts)
                .unwrap_or(3)
                .max(1),
            base_delay_ms: retry.as_ref().and_then(|r| r.base_delay_ms).unwrap_or(200),
            max_delay_ms: retry.as_ref().and_then(|r| r.max_delay_ms).unwrap_or(1000),
        }
    }

    /// Run `operation`, retrying transient failures with doubling delay.
    ///
    /// Only transient transport errors are retried; auth failures and
    /// vendor business errors surface immediately. Callers must only use
    /// this for idempotent (read) operations — vendor writes are not
    /// guaranteed idempotent.
    pub async fn run_with_retry<F, Fut, T>(&self, mut operation: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, Error>>,
    {
        // the fields are public, so guard against a zero here as well
        let attempts = self.attempts.max(1);
        let mut delay = self.base_delay_ms;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && e.is_transient() => {
                    warn!("attempt {attempt}/{attempts} failed: {e}");
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(self.max_delay_ms);
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        error!("all {attempt} attempts failed: {e}");
                    }
                    return Err(e);
                }
            }
        }
    }
}
