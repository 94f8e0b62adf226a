use std::env;
use std::str::FromStr;
use std::time::Duration;

use metaprobe_core::{FetchConfig, ScraperConfig};
use thiserror::Error;

/// Slack added on top of the pipeline timeouts for the whole-request timeout.
const REQUEST_TIMEOUT_SLACK_SECS: u64 = 5;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub page_timeout: u64,
    pub image_timeout: u64,
    pub user_agent: Option<String>,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = FetchConfig::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Config {
            host: get("METAPROBE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var("METAPROBE_PORT", get("METAPROBE_PORT"), 3000)?,
            page_timeout: parse_var("METAPROBE_PAGE_TIMEOUT", get("METAPROBE_PAGE_TIMEOUT"), defaults.timeout)?,
            image_timeout: parse_var(
                "METAPROBE_IMAGE_TIMEOUT",
                get("METAPROBE_IMAGE_TIMEOUT"),
                defaults.image_timeout,
            )?,
            user_agent: get("METAPROBE_USER_AGENT"),
            max_body_bytes: parse_var(
                "METAPROBE_MAX_BODY_BYTES",
                get("METAPROBE_MAX_BODY_BYTES"),
                defaults.max_body_bytes,
            )?,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn scraper_config(&self) -> ScraperConfig {
        let builder = ScraperConfig::builder()
            .timeout(self.page_timeout)
            .image_timeout(self.image_timeout)
            .max_body_bytes(self.max_body_bytes);

        match &self.user_agent {
            Some(ua) => builder.user_agent(ua.as_str()).build(),
            None => builder.build(),
        }
    }

    /// Upper bound for one `/metadata` request.
    ///
    /// Image and favicon enrichment run concurrently, so one image timeout
    /// covers both.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout + self.image_timeout + REQUEST_TIMEOUT_SLACK_SECS)
    }
}

fn parse_var<T: FromStr>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
