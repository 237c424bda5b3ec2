//! Runtime configuration
//!
//! Loads settings from the environment (and a `.env` file when present).
//! Command-line flags are applied on top by [`crate::cli::Cli::apply_to`].

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::api::DEFAULT_BASE_URL;
use crate::cache::{CacheOptions, Scope, DEFAULT_TTL};

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "kubegraf_tui=info";

/// Errors raised for malformed environment values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The TTL isn't a non-negative integer number of milliseconds
    #[error("Invalid {var}: '{value}' (expected milliseconds)")]
    InvalidDuration { var: &'static str, value: String },

    /// A flag variable isn't a recognizable boolean
    #[error("Invalid {var}: '{value}' (expected true/false)")]
    InvalidBool { var: &'static str, value: String },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// KubeGraf backend origin
    pub base_url: String,
    /// Cluster name used to scope the cache
    pub cluster: String,
    /// Namespaces to show; empty means all
    pub namespaces: Vec<String>,
    /// Cache time-to-live for resource lists
    pub cache_ttl: Duration,
    /// Serve stale lists while refreshing in the background
    pub background_refresh: bool,
    /// tracing-subscriber filter directive
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cluster: "default".to_string(),
            namespaces: Vec::new(),
            cache_ttl: DEFAULT_TTL,
            background_refresh: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from `.env` and the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        if let Some(url) = get("KUBEGRAF_URL") {
            config.base_url = url.trim().to_string();
        }
        if let Some(cluster) = get("KUBEGRAF_CLUSTER") {
            config.cluster = cluster.trim().to_string();
        }
        if let Some(namespaces) = get("KUBEGRAF_NAMESPACES") {
            config.namespaces = split_list(&namespaces);
        }
        if let Some(ttl) = get("KUBEGRAF_CACHE_TTL_MS") {
            config.cache_ttl = parse_millis("KUBEGRAF_CACHE_TTL_MS", &ttl)?;
        }
        if let Some(flag) = get("KUBEGRAF_BACKGROUND_REFRESH") {
            config.background_refresh = parse_bool("KUBEGRAF_BACKGROUND_REFRESH", &flag)?;
        }
        if let Some(filter) = get("RUST_LOG") {
            config.log_filter = filter;
        }

        Ok(config)
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            ttl: self.cache_ttl,
            background_refresh: self.background_refresh,
        }
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.cluster.clone(), self.namespaces.clone())
    }
}

/// Splits a comma-separated list, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_millis(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidDuration {
            var,
            value: value.to_string(),
        })
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}
