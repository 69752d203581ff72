//! Bridge timing and capacity configuration.
//!
//! Every wait in the bridge is bounded by one of these budgets (the group-list
//! wait is the exception: unbounded unless `group_list_timeout_ms` is set, but
//! always cancellable). Values are milliseconds so the struct maps 1:1 onto the
//! host's JSON config; use the `Duration` accessors in code.
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

use crate::error::{BridgeError, Result};

// ─── Defaults ────────────────────────────────────────────────────────────────

pub const DEFAULT_MEMBER_LIST_POLL_MS: u64 = 100;
pub const DEFAULT_MEMBER_LIST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MEMBER_INFO_POLL_MS: u64 = 200;
pub const DEFAULT_MEMBER_INFO_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_GROUP_INFO_POLL_MS: u64 = 100;
pub const DEFAULT_GROUP_INFO_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_GROUP_LIST_POLL_MS: u64 = 1_000;
pub const DEFAULT_ARK_POLL_MS: u64 = 100;
pub const DEFAULT_ARK_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_ARK_CACHE_CAPACITY: usize = 5;

/// Floor for every poll interval; zero would spin for the whole budget.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub member_list_poll_ms: u64,
    pub member_list_timeout_ms: u64,
    pub member_info_poll_ms: u64,
    pub member_info_timeout_ms: u64,
    pub group_info_poll_ms: u64,
    pub group_info_timeout_ms: u64,
    /// Interval at which the group-list watcher re-checks the cache-initialized flag.
    pub group_list_poll_ms: u64,
    /// `None` keeps the group-list wait unbounded.
    pub group_list_timeout_ms: Option<u64>,
    pub ark_poll_ms: u64,
    pub ark_timeout_ms: u64,
    pub ark_cache_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            member_list_poll_ms: DEFAULT_MEMBER_LIST_POLL_MS,
            member_list_timeout_ms: DEFAULT_MEMBER_LIST_TIMEOUT_MS,
            member_info_poll_ms: DEFAULT_MEMBER_INFO_POLL_MS,
            member_info_timeout_ms: DEFAULT_MEMBER_INFO_TIMEOUT_MS,
            group_info_poll_ms: DEFAULT_GROUP_INFO_POLL_MS,
            group_info_timeout_ms: DEFAULT_GROUP_INFO_TIMEOUT_MS,
            group_list_poll_ms: DEFAULT_GROUP_LIST_POLL_MS,
            group_list_timeout_ms: None,
            ark_poll_ms: DEFAULT_ARK_POLL_MS,
            ark_timeout_ms: DEFAULT_ARK_TIMEOUT_MS,
            ark_cache_capacity: DEFAULT_ARK_CACHE_CAPACITY,
        }
    }
}

impl BridgeConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::debug!("Loaded bridge config: {:?}", config);
        Ok(config)
    }

    /// Poll intervals must be non-zero.
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("member_list_poll_ms", self.member_list_poll_ms),
            ("member_info_poll_ms", self.member_info_poll_ms),
            ("group_info_poll_ms", self.group_info_poll_ms),
            ("group_list_poll_ms", self.group_list_poll_ms),
            ("ark_poll_ms", self.ark_poll_ms),
        ];
        match intervals.iter().find(|(_, ms)| *ms == 0) {
            Some((name, _)) => Err(BridgeError::InvalidArgument(format!(
                "{} must be greater than zero",
                name
            ))),
            None => Ok(()),
        }
    }

    pub fn member_list_poll(&self) -> Duration {
        poll_interval(self.member_list_poll_ms)
    }

    pub fn member_list_timeout(&self) -> Duration {
        Duration::from_millis(self.member_list_timeout_ms)
    }

    pub fn member_info_poll(&self) -> Duration {
        poll_interval(self.member_info_poll_ms)
    }

    pub fn member_info_timeout(&self) -> Duration {
        Duration::from_millis(self.member_info_timeout_ms)
    }

    pub fn group_info_poll(&self) -> Duration {
        poll_interval(self.group_info_poll_ms)
    }

    pub fn group_info_timeout(&self) -> Duration {
        Duration::from_millis(self.group_info_timeout_ms)
    }

    pub fn group_list_poll(&self) -> Duration {
        poll_interval(self.group_list_poll_ms)
    }

    pub fn group_list_timeout(&self) -> Option<Duration> {
        self.group_list_timeout_ms.map(Duration::from_millis)
    }

    pub fn ark_poll(&self) -> Duration {
        poll_interval(self.ark_poll_ms)
    }

    pub fn ark_timeout(&self) -> Duration {
        Duration::from_millis(self.ark_timeout_ms)
    }

    /// Zero is clamped to one entry.
    pub fn ark_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.ark_cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

fn poll_interval(ms: u64) -> Duration {
    Duration::from_millis(ms).max(MIN_POLL_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.member_list_timeout(), Duration::from_secs(10));
        assert_eq!(config.member_info_poll(), Duration::from_millis(200));
        assert_eq!(config.group_info_timeout(), Duration::from_secs(5));
        assert_eq!(config.group_list_timeout(), None);
        assert_eq!(config.ark_capacity().get(), 5);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = BridgeConfig::from_json(r#"{"ark_timeout_ms": 750}"#).unwrap();
        assert_eq!(config.ark_timeout(), Duration::from_millis(750));
        assert_eq!(config.member_list_poll_ms, DEFAULT_MEMBER_LIST_POLL_MS);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let config = BridgeConfig {
            ark_cache_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.ark_capacity().get(), 1);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = BridgeConfig::from_json(r#"{"ark_poll_ms": 0, "member_list_poll_ms": 0}"#)
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument(_)));
        assert!(err.to_string().contains("member_list_poll_ms"));

        // Zero budgets are fine: the wait just gives up at once.
        assert!(BridgeConfig::from_json(r#"{"ark_timeout_ms": 0}"#).is_ok());
    }

    #[test]
    fn test_zero_poll_interval_clamped() {
        let config = BridgeConfig {
            member_list_poll_ms: 0,
            group_list_poll_ms: 0,
            ark_poll_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.member_list_poll(), MIN_POLL_INTERVAL);
        assert_eq!(config.group_list_poll(), MIN_POLL_INTERVAL);
        assert_eq!(config.ark_poll(), MIN_POLL_INTERVAL);
        assert_eq!(config.ark_timeout(), Duration::from_millis(DEFAULT_ARK_TIMEOUT_MS));
    }

    #[test]
    fn test_bad_json_rejected() {
        assert!(BridgeConfig::from_json("{ not json").is_err());
    }
}
