//! Gateway configuration.
//!
//! Defaults match the delivery protocol's documented constants: a 500 ms block
//! per read phase, a pending page of 10 entries and the `-group` suffix.
//!
//! # Example
//!
//! ```no_run
//! use streamgate_core::config::GatewayConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // STREAMGATE_BLOCK_MS, STREAMGATE_PENDING_PAGE_SIZE, STREAMGATE_GROUP_SUFFIX
//! let config = GatewayConfig::from_env()?;
//! println!("block: {:?}", config.block());
//! # Ok(())
//! # }
//! ```

use crate::naming::DEFAULT_GROUP_SUFFIX;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Environment variable for [`GatewayConfig::block_ms`].
pub const ENV_BLOCK_MS: &str = "STREAMGATE_BLOCK_MS";
/// Environment variable for [`GatewayConfig::pending_page_size`].
pub const ENV_PENDING_PAGE_SIZE: &str = "STREAMGATE_PENDING_PAGE_SIZE";
/// Environment variable for [`GatewayConfig::group_suffix`].
pub const ENV_GROUP_SUFFIX: &str = "STREAMGATE_GROUP_SUFFIX";

/// Configuration error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A value could not be parsed
    #[error("Failed to parse {key}: {reason}")]
    ParseError {
        /// Name of the offending setting
        key: &'static str,
        /// Parser message
        reason: String,
    },
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Tunables of a [`Gateway`](crate::Gateway).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// How long each read phase of `consume` may wait, in milliseconds
    pub block_ms: u64,
    /// How many pending entries `list_pending` fetches
    pub pending_page_size: usize,
    /// Appended to a stream name to form its group name
    pub group_suffix: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            block_ms: 500,
            pending_page_size: 10,
            group_suffix: DEFAULT_GROUP_SUFFIX.to_string(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from process environment variables, falling back
    /// to defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but invalid
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_BLOCK_MS) {
            config.block_ms = raw.trim().parse().map_err(|e| ConfigError::ParseError {
                key: ENV_BLOCK_MS,
                reason: format!("{e}"),
            })?;
        }
        if let Some(raw) = lookup(ENV_PENDING_PAGE_SIZE) {
            config.pending_page_size =
                raw.trim().parse().map_err(|e| ConfigError::ParseError {
                    key: ENV_PENDING_PAGE_SIZE,
                    reason: format!("{e}"),
                })?;
        }
        if let Some(raw) = lookup(ENV_GROUP_SUFFIX) {
            config.group_suffix = raw;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_ms == 0 {
            // BLOCK 0 waits forever.
            return Err(ConfigError::ValidationError(
                "block_ms must be > 0".to_string(),
            ));
        }
        if self.pending_page_size == 0 {
            return Err(ConfigError::ValidationError(
                "pending_page_size must be > 0".to_string(),
            ));
        }
        if self.group_suffix.is_empty() {
            return Err(ConfigError::ValidationError(
                "group_suffix cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the read block duration
    #[must_use]
    pub const fn block(&self) -> Duration {
        Duration::from_millis(self.block_ms)
    }
}
