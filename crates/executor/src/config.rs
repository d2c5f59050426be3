//! Executor configuration.
//!
//! These structs are the `[scan]` and `[tasks]` sections of
//! `recordgate.toml`; every field has a default so sections may be partial.

use serde::{Deserialize, Serialize};

/// Scan pagination limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Page size when the request omits `maxRecords`
    #[serde(default = "default_max_records")]
    pub default_max_records: usize,
    /// Largest page size a request may ask for
    #[serde(default = "default_max_records_limit")]
    pub max_records_limit: usize,
}

fn default_max_records() -> usize {
    100
}

fn default_max_records_limit() -> usize {
    10_000
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            default_max_records: default_max_records(),
            max_records_limit: default_max_records_limit(),
        }
    }
}

/// Background task registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRegistryConfig {
    /// Seconds a finished task stays queryable
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
    /// Upper bound on tracked tasks, running and finished
    #[serde(default = "default_max_tracked_tasks")]
    pub max_tracked_tasks: usize,
    /// Milliseconds between polls of running jobs
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_retention_secs() -> u64 {
    3600
}

fn default_max_tracked_tasks() -> usize {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for TaskRegistryConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention_secs(),
            max_tracked_tasks: default_max_tracked_tasks(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: TaskRegistryConfig =
            serde_json::from_str(r#"{"max_tracked_tasks": 2}"#).unwrap();
        assert_eq!(config.max_tracked_tasks, 2);
        assert_eq!(config.retention_secs, 3600);
        assert_eq!(config.poll_interval_ms, 100);
    }

    #[test]
    fn test_scan_defaults() {
        let config = ScanConfig::default();
        assert!(config.default_max_records <= config.max_records_limit);
    }
}
