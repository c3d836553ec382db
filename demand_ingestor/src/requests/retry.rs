use std::future::Future;

use tracing::warn;

use crate::providers::ProviderError;

/// How many times a retryable provider failure is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl RetryPolicy {
    pub const ONCE: RetryPolicy = RetryPolicy { max_retries: 1 };

    /// Runs `op`, repeating it while the error is retryable and attempts remain.
    pub async fn run<T, F, Fut>(self, what: &str, mut op: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(%what, attempt, error = %err, "retrying request");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::ONCE
    }
}
