//! Broker configuration
//!
//! Defaults, a JSON file format and environment overrides for the server and
//! its rate limiter.

use crate::error::{BrokerError, BrokerResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Token-bucket settings shared by every caller key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Bucket capacity
    pub max_tokens: f64,

    /// Tokens added per second
    pub refill_rate: f64,

    /// Tokens consumed by one request
    pub cost_per_request: f64,

    /// Drop buckets idle this long; `None` keeps them for the process lifetime
    pub idle_ttl_secs: Option<u64>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_tokens: 100.0,
            refill_rate: 10.0,
            cost_per_request: 1.0,
            idle_ttl_secs: None,
        }
    }
}

impl RateLimitConfig {
    /// Effectively no limit (use with caution)
    pub fn unlimited() -> Self {
        Self {
            max_tokens: f64::MAX,
            refill_rate: f64::MAX,
            cost_per_request: 1.0,
            idle_ttl_secs: None,
        }
    }

    /// Tight limits for testing or shared public deployments
    pub fn strict() -> Self {
        Self {
            max_tokens: 20.0,
            refill_rate: 1.0,
            cost_per_request: 1.0,
            idle_ttl_secs: Some(900),
        }
    }

    pub fn validate(&self) -> BrokerResult<()> {
        if !(self.max_tokens > 0.0) {
            return Err(BrokerError::Config("rate_limit.max_tokens must be positive".to_string()));
        }
        if !(self.refill_rate > 0.0) {
            return Err(BrokerError::Config("rate_limit.refill_rate must be positive".to_string()));
        }
        if !(self.cost_per_request > 0.0) {
            return Err(BrokerError::Config(
                "rate_limit.cost_per_request must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,

    /// JSON files holding vendor tool arrays
    pub catalog_paths: Vec<PathBuf>,

    /// Register an echoing executor for every category
    pub dry_run: bool,

    pub default_page_limit: usize,
    pub default_discover_limit: usize,

    pub rate_limit: RateLimitConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            catalog_paths: Vec::new(),
            dry_run: false,
            default_page_limit: 50,
            default_discover_limit: 10,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl BrokerConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> BrokerResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `TOOLBROKER_*` environment variables.
    pub fn from_env() -> BrokerResult<Self> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps variable names to values.
    pub fn with_overrides<F>(mut self, lookup: F) -> BrokerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("TOOLBROKER_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("TOOLBROKER_PORT") {
            self.port = parse_var("TOOLBROKER_PORT", &port)?;
        }
        // Comma separated; paths may contain `:` (Windows drives)
        if let Some(paths) = lookup("TOOLBROKER_CATALOG") {
            self.catalog_paths = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect();
        }
        if let Some(dry_run) = lookup("TOOLBROKER_DRY_RUN") {
            self.dry_run = matches!(dry_run.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(max) = lookup("TOOLBROKER_RATE_MAX_TOKENS") {
            self.rate_limit.max_tokens = parse_var("TOOLBROKER_RATE_MAX_TOKENS", &max)?;
        }
        if let Some(refill) = lookup("TOOLBROKER_RATE_REFILL") {
            self.rate_limit.refill_rate = parse_var("TOOLBROKER_RATE_REFILL", &refill)?;
        }
        if let Some(ttl) = lookup("TOOLBROKER_RATE_IDLE_TTL") {
            self.rate_limit.idle_ttl_secs = Some(parse_var("TOOLBROKER_RATE_IDLE_TTL", &ttl)?);
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> BrokerResult<()> {
        if self.default_page_limit == 0 {
            return Err(BrokerError::Config("default_page_limit must be at least 1".to_string()));
        }
        self.rate_limit.validate()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> BrokerResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| BrokerError::Config(format!("{name} has an invalid value: '{value}'")))
}
