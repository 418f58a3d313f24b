use super::error::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Public VIES endpoint root. Paths below `/rest-api` are appended to it.
pub const DEFAULT_BASE_URL: &str = "https://ec.europa.eu/taxation_customs/vies";

/// Desktop browser identification; VIES blocks obvious automation clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn default_workers() -> usize {
    5
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    2000
}
fn default_courtesy_delay_ms() -> u64 {
    500
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_breaker_threshold() -> u32 {
    5
}
fn default_breaker_reduced_budget() -> u32 {
    1
}
fn default_checkpoint_every() -> usize {
    10
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_true() -> bool {
    true
}

/// Tuning knobs for one validation engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Concurrent workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Maximum remote attempts per row.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Pause between attempts of the same row (milliseconds).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Pause before every remote call (milliseconds).
    #[serde(default = "default_courtesy_delay_ms")]
    pub courtesy_delay_ms: u64,
    /// HTTP request timeout (seconds).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Consecutive transient failures before a country is degraded.
    #[serde(default = "default_breaker_threshold")]
    pub breaker_threshold: u32,
    /// Attempts granted per row for a degraded country.
    #[serde(default = "default_breaker_reduced_budget")]
    pub breaker_reduced_budget: u32,
    /// Write a checkpoint after this many newly completed rows.
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Drop repeated VAT numbers before dispatch.
    #[serde(default = "default_true")]
    pub skip_duplicates: bool,
    /// Use the authenticated endpoint when a requester VAT is given.
    #[serde(default = "default_true")]
    pub authenticated: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            courtesy_delay_ms: default_courtesy_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            breaker_threshold: default_breaker_threshold(),
            breaker_reduced_budget: default_breaker_reduced_budget(),
            checkpoint_every: default_checkpoint_every(),
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            skip_duplicates: true,
            authenticated: true,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `VIES_*` environment variables.
    ///
    /// Recognised: `VIES_WORKERS`, `VIES_MAX_RETRIES`, `VIES_RETRY_DELAY_MS`,
    /// `VIES_COURTESY_DELAY_MS`, `VIES_REQUEST_TIMEOUT_SECS`,
    /// `VIES_BREAKER_THRESHOLD`, `VIES_BREAKER_REDUCED_BUDGET`,
    /// `VIES_CHECKPOINT_EVERY`, `VIES_BASE_URL`, `VIES_USER_AGENT`,
    /// `VIES_SKIP_DUPLICATES`, `VIES_AUTHENTICATED`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("VIES_WORKERS") {
            config.workers = parse_number("VIES_WORKERS", &v)?;
        }
        if let Some(v) = get("VIES_MAX_RETRIES") {
            config.max_retries = parse_number("VIES_MAX_RETRIES", &v)?;
        }
        if let Some(v) = get("VIES_RETRY_DELAY_MS") {
            config.retry_delay_ms = parse_number("VIES_RETRY_DELAY_MS", &v)?;
        }
        if let Some(v) = get("VIES_COURTESY_DELAY_MS") {
            config.courtesy_delay_ms = parse_number("VIES_COURTESY_DELAY_MS", &v)?;
        }
        if let Some(v) = get("VIES_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_number("VIES_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("VIES_BREAKER_THRESHOLD") {
            config.breaker_threshold = parse_number("VIES_BREAKER_THRESHOLD", &v)?;
        }
        if let Some(v) = get("VIES_BREAKER_REDUCED_BUDGET") {
            config.breaker_reduced_budget = parse_number("VIES_BREAKER_REDUCED_BUDGET", &v)?;
        }
        if let Some(v) = get("VIES_CHECKPOINT_EVERY") {
            config.checkpoint_every = parse_number("VIES_CHECKPOINT_EVERY", &v)?;
        }
        if let Some(url) = get("VIES_BASE_URL") {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::Config(
                    "VIES_BASE_URL must start with http:// or https://".into(),
                ));
            }
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ua) = get("VIES_USER_AGENT") {
            config.user_agent = ua;
        }
        if let Some(v) = get("VIES_SKIP_DUPLICATES") {
            config.skip_duplicates = parse_flag("VIES_SKIP_DUPLICATES", &v)?;
        }
        if let Some(v) = get("VIES_AUTHENTICATED") {
            config.authenticated = parse_flag("VIES_AUTHENTICATED", &v)?;
        }

        config.validate()?;
        tracing::debug!(
            workers = config.workers,
            max_retries = config.max_retries,
            base_url = %config.base_url,
            "engine configuration loaded"
        );
        Ok(config)
    }

    /// Reject settings that would stall or disable the engine.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".into()));
        }
        if self.max_retries == 0 {
            return Err(Error::Config("max_retries must be at least 1".into()));
        }
        if self.checkpoint_every == 0 {
            return Err(Error::Config("checkpoint_every must be at least 1".into()));
        }
        if self.breaker_reduced_budget == 0 {
            return Err(Error::Config(
                "breaker_reduced_budget must be at least 1".into(),
            ));
        }
        if self.breaker_threshold == 0 {
            return Err(Error::Config("breaker_threshold must be at least 1".into()));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn courtesy_delay(&self) -> Duration {
        Duration::from_millis(self.courtesy_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a non-negative number, got '{value}'")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{key} must be true or false, got '{value}'"))),
    }
}
