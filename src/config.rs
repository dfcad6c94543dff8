//! Notification center configuration.
//!
//! Two tunables govern the center's policy: the dedup window and the
//! collection capacity. Both carry defaults so an empty TOML document is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_DEDUP_WINDOW_SECS: u64 = 60;
pub const DEFAULT_MAX_RECORDS: usize = 100;
pub const DEFAULT_BROADCAST_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for '{field}': {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CenterConfig {
    /// Repeated identical emits within this many seconds collapse into the
    /// existing unread record. Zero disables deduplication.
    pub dedup_window_secs: u64,
    /// Cap on the persisted collection; the oldest records are evicted
    /// first once it is exceeded.
    pub max_records: usize,
    /// Capacity of the in-context listener channel.
    pub broadcast_capacity: usize,
}

impl Default for CenterConfig {
    fn default() -> Self {
        Self {
            dedup_window_secs: DEFAULT_DEDUP_WINDOW_SECS,
            max_records: DEFAULT_MAX_RECORDS,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl CenterConfig {
    /// Parses and validates a TOML document. Missing fields take their
    /// defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_records == 0 {
            return Err(ConfigError::Invalid {
                field: "max_records",
                reason: "capacity must be at least 1".to_string(),
            });
        }
        if self.broadcast_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "broadcast_capacity",
                reason: "listener channel capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn dedup_window_ms(&self) -> i64 {
        (self.dedup_window_secs as i64).saturating_mul(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = CenterConfig::from_toml_str("").unwrap();
        assert_eq!(config, CenterConfig::default());
        assert_eq!(config.dedup_window_secs, DEFAULT_DEDUP_WINDOW_SECS);
        assert_eq!(config.max_records, DEFAULT_MAX_RECORDS);
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let config = CenterConfig::from_toml_str("dedup_window_secs = 5\n").unwrap();
        assert_eq!(config.dedup_window_secs, 5);
        assert_eq!(config.max_records, DEFAULT_MAX_RECORDS);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = CenterConfig::from_toml_str("max_records = 0\n").unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "max_records"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(CenterConfig::from_toml_str("max_popups = 3\n").is_err());
    }

    #[test]
    fn dedup_window_in_millis() {
        let config = CenterConfig {
            dedup_window_secs: 2,
            ..Default::default()
        };
        assert_eq!(config.dedup_window_ms(), 2000);
    }
}
