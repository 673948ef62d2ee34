use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use serde::Deserialize;

use crate::services::poller::PollerConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub auth_token: Option<String>,
    pub poll_interval_ms: u64,
    pub poll_max_attempts: u32,
    pub redirect_delay_ms: u64,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            api_base_url: env::var("STOREFRONT_API_URL")?,
            auth_token: env::var("STOREFRONT_AUTH_TOKEN").ok(),
            poll_interval_ms: env::var("POLL_INTERVAL_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()?,
            poll_max_attempts: env::var("POLL_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            redirect_delay_ms: env::var("REDIRECT_DELAY_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()?,
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn poller(&self) -> PollerConfig {
        PollerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.poll_max_attempts,
            redirect_delay: Duration::from_millis(self.redirect_delay_ms),
        }
    }
}
