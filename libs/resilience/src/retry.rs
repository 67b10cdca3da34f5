/// Retry policy with a fixed delay between attempts
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first failure
    pub max_retries: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("max retries ({retries}) exceeded: {last}")]
    Exhausted { retries: u32, last: E },
    #[error("{0}")]
    Permanent(E),
}

impl<E> RetryError<E> {
    /// The last underlying failure, whichever way the retry loop ended.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Permanent(e) => e,
        }
    }
}

/// Execute a future with retry logic.
///
/// `is_retryable` decides whether a failure is worth another attempt.
/// Non-retryable failures return immediately without sleeping; retryable
/// ones are reattempted up to `max_retries` times with `delay` between
/// attempts.
pub async fn with_retry<F, Fut, T, E>(
    config: RetryConfig,
    is_retryable: impl Fn(&E) -> bool,
    mut f: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if !is_retryable(&e) => return Err(RetryError::Permanent(e)),
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    warn!("Max retries ({}) reached: {}", config.max_retries, e);
                    return Err(RetryError::Exhausted {
                        retries: config.max_retries,
                        last: e,
                    });
                }

                warn!(
                    "Retry attempt {}/{}, waiting {:?}",
                    attempt, config.max_retries, config.delay
                );

                tokio::time::sleep(config.delay).await;
            }
        }
    }
}
