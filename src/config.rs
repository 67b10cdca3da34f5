use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    /// Retry attempts allowed after the first failed send.
    pub send_retry_max: u32,
    /// Fixed delay between send attempts.
    pub send_retry_delay: Duration,
    /// Upper bound on rows returned by one ordered history fetch.
    pub history_fetch_limit: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError("DATABASE_URL missing".into()))?;
        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let send_retry_max = env::var("SEND_RETRY_MAX")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(2);
        let send_retry_delay_ms = env::var("SEND_RETRY_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1_000);
        let history_fetch_limit = env::var("HISTORY_FETCH_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(200);

        Ok(Self {
            database_url,
            redis_url,
            send_retry_max,
            send_retry_delay: Duration::from_millis(send_retry_delay_ms),
            history_fetch_limit,
        })
    }

    /// Retry policy for the send pipeline.
    pub fn retry_config(&self) -> resilience::RetryConfig {
        resilience::RetryConfig {
            max_retries: self.send_retry_max,
            delay: self.send_retry_delay,
        }
    }
}
