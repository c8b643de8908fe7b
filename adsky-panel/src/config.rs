//! Panel configuration

use std::collections::HashMap;
use std::str::FromStr;

use adsky_core::token::DEFAULT_RESET_TTL_SECONDS;
use adsky_core::TokenConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Public URL of the panel, used to build email links and redirects
    pub website_root: String,

    /// SQLite database path. Everything is kept in memory when unset.
    pub database: Option<String>,

    /// Token lifetimes and bcrypt cost
    pub tokens: TokenConfig,

    /// Seconds between two sweeps of expired or consumed tokens
    pub cleanup_interval_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            website_root: "http://localhost:3000/".to_string(),
            database: None,
            tokens: TokenConfig::default(),
            cleanup_interval_seconds: 3600,
        }
    }
}

impl Config {
    /// Create config from environment variables
    ///
    /// - ADSKY_PORT (default: 3000)
    /// - ADSKY_WEBSITE_ROOT (default: http://localhost:3000/)
    /// - ADSKY_DATABASE (default: in-memory)
    /// - ADSKY_REGISTRATION_TTL_SECONDS (default: 31557600)
    /// - ADSKY_RESET_TTL_SECONDS (default and maximum: 86400)
    /// - ADSKY_CLEANUP_INTERVAL_SECONDS (default: 3600)
    /// - ADSKY_BCRYPT_COST (default: 12)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|s| !s.is_empty());
        let defaults = Self::default();

        let mut tokens = defaults.tokens.clone();
        tokens.registration_ttl_seconds = parse_or(
            get("ADSKY_REGISTRATION_TTL_SECONDS"),
            "ADSKY_REGISTRATION_TTL_SECONDS",
            tokens.registration_ttl_seconds,
        )
        .max(1);
        tokens.reset_ttl_seconds = parse_or(
            get("ADSKY_RESET_TTL_SECONDS"),
            "ADSKY_RESET_TTL_SECONDS",
            tokens.reset_ttl_seconds,
        )
        .clamp(1, DEFAULT_RESET_TTL_SECONDS);
        tokens.hash_cost = parse_or(
            get("ADSKY_BCRYPT_COST"),
            "ADSKY_BCRYPT_COST",
            tokens.hash_cost,
        )
        .clamp(4, 31);

        Self {
            port: parse_or(get("ADSKY_PORT"), "ADSKY_PORT", defaults.port),
            website_root: get("ADSKY_WEBSITE_ROOT").unwrap_or(defaults.website_root),
            database: get("ADSKY_DATABASE"),
            tokens,
            cleanup_interval_seconds: parse_or(
                get("ADSKY_CLEANUP_INTERVAL_SECONDS"),
                "ADSKY_CLEANUP_INTERVAL_SECONDS",
                defaults.cleanup_interval_seconds,
            )
            .max(1),
        }
    }

    /// Absolute URL for a path below the website root
    pub fn link(&self, path: &str) -> String {
        let root = self.website_root.trim_end_matches('/');
        format!("{}/{}", root, path.trim_start_matches('/'))
    }
}

fn parse_or<T: FromStr + Copy>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable configuration value");
            default
        }),
        None => default,
    }
}

/// Convenience for tests and tools that hold settings in a map
impl From<&HashMap<String, String>> for Config {
    fn from(vars: &HashMap<String, String>) -> Self {
        Self::from_lookup(|key| vars.get(key).cloned())
    }
}
