// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{frame, queue, threads};
use crate::errors::{WorkerError, WorkerResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Worker configuration
///
/// Passed into the worker at construction. Nothing here is global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Log per-stage timings (decode, crop, rotate, predict) at debug level
    pub print_timing: bool,
    /// Shorter edge decoded frames are scaled to
    pub min_image_edge: u32,
    /// Side length of the warm-up placeholder image
    pub warm_up_image_size: u32,
    /// Backlog length that triggers a growth warning (0 disables)
    pub backlog_warn_threshold: usize,
    /// Name of the consumer thread
    pub worker_thread_name: String,
    /// Name of the callback message-loop thread
    pub callback_thread_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            print_timing: false,
            min_image_edge: frame::MIN_IMAGE_EDGE,
            warm_up_image_size: frame::WARM_UP_IMAGE_SIZE,
            backlog_warn_threshold: queue::BACKLOG_WARN_THRESHOLD,
            worker_thread_name: threads::WORKER_THREAD_NAME.to_string(),
            callback_thread_name: threads::CALLBACK_THREAD_NAME.to_string(),
        }
    }
}

impl WorkerConfig {
    /// Default location: `<config dir>/cardscan/worker.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cardscan").join("worker.json"))
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> WorkerResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> WorkerResult<Self> {
        debug!(path = %path.display(), "Loading worker config");
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load_or_default() -> WorkerResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> WorkerResult<()> {
        if self.min_image_edge == 0 {
            return Err(WorkerError::Config("min_image_edge must be positive".into()));
        }
        if self.warm_up_image_size == 0 {
            return Err(WorkerError::Config(
                "warm_up_image_size must be positive".into(),
            ));
        }
        if self.worker_thread_name.is_empty() || self.callback_thread_name.is_empty() {
            return Err(WorkerError::Config("thread names must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = WorkerConfig::from_json_str(r#"{ "print_timing": true }"#).unwrap();
        assert!(config.print_timing);
        assert_eq!(config.min_image_edge, frame::MIN_IMAGE_EDGE);
        assert_eq!(config.worker_thread_name, "ml-worker");
    }

    #[test]
    fn test_rejects_zero_edge() {
        let err = WorkerConfig::from_json_str(r#"{ "min_image_edge": 0 }"#).unwrap_err();
        assert!(matches!(err, WorkerError::Config(_)));
    }

    #[test]
    fn test_rejects_empty_thread_name() {
        let err = WorkerConfig::from_json_str(r#"{ "worker_thread_name": "" }"#).unwrap_err();
        assert!(err.to_string().contains("thread names"));
    }

    #[test]
    fn test_round_trip_through_json() {
        let config = WorkerConfig {
            print_timing: true,
            backlog_warn_threshold: 4,
            ..WorkerConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(WorkerConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = WorkerConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, WorkerError::Config(_)));
    }
}
