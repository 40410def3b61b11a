use serde::Deserialize;
use crate::error::Result;
use crate::utils::time::TimeUnit;
use config::{Config as ConfigLoader, Environment};
use std::time::Duration;

const ENV_PREFIX: &str = "CRPT";

// Refill every 5 units of the configured time unit unless overridden.
const DEFAULT_REFRESH_PERIODS: u32 = 5;
const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // General
    pub log_level: String,

    // Rate window
    pub time_unit: TimeUnit,
    pub request_limit: usize,
    pub refresh_periods: u32,

    // HTTP
    pub http_timeout_ms: u64,
}

impl Config {
    /// Programmatic configuration with the default window length.
    pub fn new(time_unit: TimeUnit, request_limit: usize) -> Self {
        Self {
            log_level: "info".to_string(),
            time_unit,
            request_limit,
            refresh_periods: DEFAULT_REFRESH_PERIODS,
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }

    /// Load from `.env` and `CRPT_*` environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Self::from_env(Environment::with_prefix(ENV_PREFIX))
    }

    fn from_env(env: Environment) -> Result<Self> {
        let config = ConfigLoader::builder()
            .set_default("log_level", "info")?
            .set_default("time_unit", "seconds")?
            .set_default("request_limit", 10_i64)?
            .set_default("refresh_periods", i64::from(DEFAULT_REFRESH_PERIODS))?
            .set_default("http_timeout_ms", DEFAULT_HTTP_TIMEOUT_MS as i64)?
            .add_source(env.try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Length of one refill window.
    pub fn period(&self) -> Duration {
        self.time_unit.duration(self.refresh_periods)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}
