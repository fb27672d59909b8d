use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::flow::Diagnostics;
use crate::logging::{FileSink, LogLevel, Logger, StderrSink};
use crate::tabs::{ReselectPolicy, TabHostOptions, TabId};

pub const DEFAULT_LOG_MAX_BYTES: u64 = 1024 * 1024;

/// Application settings read from JSON. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Tabs to show, in order. Omitted means every declared tab.
    pub tabs: Option<Vec<TabId>>,
    pub reselect_policy: ReselectPolicy,
    pub log_level: LogLevel,
    /// JSON-lines log file; logs go to stderr when unset.
    pub log_file: Option<PathBuf>,
    pub log_max_bytes: u64,
    pub metrics: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tabs: None,
            reselect_policy: ReselectPolicy::default(),
            log_level: LogLevel::Info,
            log_file: None,
            log_max_bytes: DEFAULT_LOG_MAX_BYTES,
            metrics: false,
        }
    }
}

impl AppConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn host_options(&self) -> TabHostOptions {
        TabHostOptions {
            tabs: self.tabs.clone(),
            reselect_policy: self.reselect_policy,
        }
    }

    pub fn build_logger(&self) -> Result<Logger> {
        let logger = match self.log_file.as_ref() {
            Some(path) => Logger::new(FileSink::new(path, self.log_max_bytes)?),
            None => Logger::new(StderrSink),
        };
        Ok(logger.with_min_level(self.log_level))
    }

    pub fn build_diagnostics(&self) -> Result<Diagnostics> {
        let diagnostics = Diagnostics::new().with_logger(self.build_logger()?);
        Ok(if self.metrics {
            diagnostics.with_metrics()
        } else {
            diagnostics
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlowError;

    #[test]
    fn empty_object_uses_defaults() {
        let config = AppConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.host_options().tabs.is_none());
    }

    #[test]
    fn parses_every_field() {
        let config = AppConfig::from_json_str(
            r#"{
                "tabs": ["more", "main"],
                "reselect_policy": "reset_to_root",
                "log_level": "debug",
                "log_max_bytes": 2048,
                "metrics": true
            }"#,
        )
        .unwrap();
        let options = config.host_options();
        assert_eq!(options.tabs, Some(vec![TabId::from("more"), TabId::from("main")]));
        assert_eq!(options.reselect_policy, ReselectPolicy::ResetToRoot);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_max_bytes, 2048);
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let err = AppConfig::from_json_str(r#"{"reselect_policy": "sometimes"}"#).unwrap_err();
        assert!(matches!(err, FlowError::Config(_)));
    }

    #[test]
    fn load_reads_file_and_wires_file_logging() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("flows.log");
        let config_path = dir.path().join("app.json");
        let raw = serde_json::json!({
            "log_file": log_path,
            "log_level": "warn",
            "metrics": true
        });
        fs::write(&config_path, raw.to_string()).unwrap();

        let config = AppConfig::load(&config_path).unwrap();
        let diagnostics = config.build_diagnostics().unwrap();
        let logger = diagnostics.logger().unwrap();
        assert_eq!(logger.min_level(), LogLevel::Warn);
        logger.log(LogLevel::Info, "flowcoord::test", "dropped").unwrap();
        logger.log(LogLevel::Error, "flowcoord::test", "kept").unwrap();
        assert!(diagnostics.snapshot().is_some());

        let contents = fs::read_to_string(&log_path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("kept"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, FlowError::Io(_)));
    }
}
