//! # History Configuration
//!
//! Limits and switches for the history service. Bucket epoch and size are
//! not configurable, see [`crate::domain::bucket`].

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    DEFAULT_BUCKET_QUANTITY, DEFAULT_LIMIT, DEFAULT_SINCE_LIMIT, FUTURE_SINCE_FALLBACK_LIMIT,
};

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },

    /// A limit that must be positive is zero.
    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
}

/// History service configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Limit applied when a request carries none.
    pub default_limit: usize,

    /// Limit applied on the history-since path when a request carries none.
    pub since_default_limit: usize,

    /// Limit substituted when `since` is in the future.
    pub future_since_limit: usize,

    /// Buckets walked by the column-store backend without a lower bound.
    pub bucket_quantity: usize,

    /// Skip the ACL lookup and authorize every requested topic.
    pub allow_anonymous: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            since_default_limit: DEFAULT_SINCE_LIMIT,
            future_since_limit: FUTURE_SINCE_FALLBACK_LIMIT,
            bucket_quantity: DEFAULT_BUCKET_QUANTITY,
            allow_anonymous: false,
        }
    }
}

impl HistoryConfig {
    /// Create a config for testing (smaller values).
    pub fn for_testing() -> Self {
        Self {
            default_limit: 5,
            since_default_limit: 5,
            future_since_limit: 20,
            bucket_quantity: 4,
            allow_anonymous: false,
        }
    }

    /// Defaults overridden by environment variables.
    ///
    /// - `TH_DEFAULT_LIMIT`
    /// - `HISTORYSINCE_LIMIT`
    /// - `TH_FUTURE_SINCE_LIMIT`
    /// - `TH_BUCKET_QUANTITY`
    /// - `TH_ALLOW_ANONYMOUS` (`true`/`1`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`HistoryConfig::from_env`] over an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            default_limit: parse_or(&lookup, "TH_DEFAULT_LIMIT", defaults.default_limit)?,
            since_default_limit: parse_or(
                &lookup,
                "HISTORYSINCE_LIMIT",
                defaults.since_default_limit,
            )?,
            future_since_limit: parse_or(
                &lookup,
                "TH_FUTURE_SINCE_LIMIT",
                defaults.future_since_limit,
            )?,
            bucket_quantity: parse_or(&lookup, "TH_BUCKET_QUANTITY", defaults.bucket_quantity)?,
            allow_anonymous: lookup("TH_ALLOW_ANONYMOUS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.allow_anonymous),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every request return nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_limit == 0 {
            return Err(ConfigError::ZeroValue("default_limit"));
        }
        if self.since_default_limit == 0 {
            return Err(ConfigError::ZeroValue("since_default_limit"));
        }
        if self.future_since_limit == 0 {
            return Err(ConfigError::ZeroValue("future_since_limit"));
        }
        if self.bucket_quantity == 0 {
            return Err(ConfigError::ZeroValue("bucket_quantity"));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { var, value: raw }),
        None => Ok(default),
    }
}
