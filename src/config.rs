//! Bridge configuration: defaults, environment / YAML loading and validation.
//!
//! Every knob can be set through `AIRS_*` environment variables. Malformed
//! values are reported as configuration errors instead of silently falling
//! back to defaults.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://service.api.aisecurity.paloaltonetworks.com";

/// Upper bound for `cache.ttl_seconds` (one year).
pub const MAX_CACHE_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 300,
            max_size: 1000,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_ms: 60_000,
        }
    }
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub api_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub cache: CacheSettings,
    pub rate_limit: RateLimitSettings,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            timeout_ms: 30_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
            cache: CacheSettings::default(),
            rate_limit: RateLimitSettings::default(),
        }
    }
}

// The API key must never end up in logs.
impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("cache", &self.cache)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

fn redact(key: &str) -> &'static str {
    if key.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl BridgeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Copy of the config safe to print (key replaced).
    pub fn redacted(&self) -> Self {
        Self {
            api_key: redact(&self.api_key).to_string(),
            ..self.clone()
        }
    }

    /// Load from `AIRS_*` environment variables on top of the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source (used by `from_env` and tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup("AIRS_API_URL") {
            cfg.api_url = v;
        }
        if let Some(v) = lookup("AIRS_API_KEY") {
            cfg.api_key = v;
        }
        if let Some(v) = parse_var(&lookup, "AIRS_TIMEOUT_MS")? {
            cfg.timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "AIRS_MAX_RETRIES")? {
            cfg.max_retries = v;
        }
        if let Some(v) = parse_var(&lookup, "AIRS_RETRY_DELAY_MS")? {
            cfg.retry_delay_ms = v;
        }
        if let Some(v) = parse_bool_var(&lookup, "AIRS_CACHE_ENABLED")? {
            cfg.cache.enabled = v;
        }
        if let Some(v) = parse_var(&lookup, "AIRS_CACHE_TTL_SECONDS")? {
            cfg.cache.ttl_seconds = v;
        }
        if let Some(v) = parse_var(&lookup, "AIRS_CACHE_MAX_SIZE")? {
            cfg.cache.max_size = v;
        }
        if let Some(v) = parse_bool_var(&lookup, "AIRS_RATE_LIMIT_ENABLED")? {
            cfg.rate_limit.enabled = v;
        }
        if let Some(v) = parse_var(&lookup, "AIRS_RATE_LIMIT_MAX_REQUESTS")? {
            cfg.rate_limit.max_requests = v;
        }
        if let Some(v) = parse_var(&lookup, "AIRS_RATE_LIMIT_WINDOW_MS")? {
            cfg.rate_limit.window_ms = v;
        }
        Ok(cfg)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Reject configurations the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(config_error(
                "API key is required (set AIRS_API_KEY)",
                "api_key",
                None,
            ));
        }
        match url::Url::parse(&self.api_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            Ok(u) => {
                return Err(config_error(
                    "API URL must use http or https",
                    "api_url",
                    Some(format!("scheme: {}", u.scheme())),
                ))
            }
            Err(e) => {
                return Err(config_error(
                    "API URL is not a valid URL",
                    "api_url",
                    Some(e.to_string()),
                ))
            }
        }
        if self.timeout_ms == 0 {
            return Err(config_error("timeout must be positive", "timeout_ms", None));
        }
        if self.cache.enabled {
            if self.cache.max_size == 0 {
                return Err(config_error(
                    "cache max_size must be positive when the cache is enabled",
                    "cache.max_size",
                    None,
                ));
            }
            if self.cache.ttl_seconds == 0 {
                return Err(config_error(
                    "cache ttl_seconds must be positive when the cache is enabled",
                    "cache.ttl_seconds",
                    None,
                ));
            }
            if self.cache.ttl_seconds > MAX_CACHE_TTL_SECONDS {
                return Err(config_error(
                    "cache ttl_seconds is too large",
                    "cache.ttl_seconds",
                    Some(format!(
                        "got {}, maximum {}",
                        self.cache.ttl_seconds, MAX_CACHE_TTL_SECONDS
                    )),
                ));
            }
        }
        if self.rate_limit.enabled {
            if self.rate_limit.max_requests == 0 {
                return Err(config_error(
                    "rate limit max_requests must be positive when rate limiting is enabled",
                    "rate_limit.max_requests",
                    None,
                ));
            }
            if self.rate_limit.window_ms == 0 {
                return Err(config_error(
                    "rate limit window_ms must be positive when rate limiting is enabled",
                    "rate_limit.window_ms",
                    None,
                ));
            }
        }
        Ok(())
    }
}

fn config_error(msg: &str, field: &str, details: Option<String>) -> Error {
    let mut ctx = ErrorContext::new()
        .with_field_path(field)
        .with_source("config");
    if let Some(d) = details {
        ctx = ctx.with_details(d);
    }
    Error::configuration_with_context(msg, ctx)
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            config_error(
                "invalid numeric value",
                name,
                Some(format!("got {:?}", raw)),
            )
        }),
    }
}

fn parse_bool_var<F>(lookup: &F, name: &str) -> Result<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(config_error(
                "invalid boolean value",
                name,
                Some(format!("got {:?}", raw)),
            )),
        },
    }
}
