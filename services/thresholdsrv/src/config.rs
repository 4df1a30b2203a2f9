//! Thresholdsrv configuration
//!
//! Layered with figment: built-in defaults, then the YAML file, then
//! `THRESHOLDSRV_` environment variables (`__` separates nested keys, e.g.
//! `THRESHOLDSRV_SCHEDULER__QUEUE`).

use crate::error::{HandlerError, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/thresholdsrv.yaml";

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default)]
    pub enricher: EnricherConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Enrichment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnricherConfig {
    /// Lookback window before now, in seconds
    #[serde(default = "default_lookback_window")]
    pub lookback_window_secs: u64,
    /// Earliest allowed lookback start before now, in seconds
    #[serde(default = "default_lookback_floor")]
    pub lookback_floor_secs: u64,
}

impl EnricherConfig {
    pub fn lookback_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.lookback_window_secs.min(i32::MAX as u64) as i64)
    }

    pub fn lookback_floor(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.lookback_floor_secs.min(i32::MAX as u64) as i64)
    }
}

/// Deferred notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Target scheduler queue
    #[serde(default = "default_queue")]
    pub queue: String,
    /// Handler name carried by deferred calls
    #[serde(default = "default_handler")]
    pub handler: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of the bracketed text format
    #[serde(default)]
    pub json: bool,
}

fn default_lookback_window() -> u64 {
    6 * 3600
}

fn default_lookback_floor() -> u64 {
    6 * 24 * 3600
}

fn default_queue() -> String {
    "scheduler".to_string()
}

fn default_handler() -> String {
    "threshold_escalation".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            lookback_window_secs: default_lookback_window(),
            lookback_floor_secs: default_lookback_floor(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            queue: default_queue(),
            handler: default_handler(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl ThresholdConfig {
    /// Load configuration from `path`, or the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

        Figment::from(Serialized::defaults(Self::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("THRESHOLDSRV_").split("__"))
            .extract()
            .map_err(|e| HandlerError::Config(format!("Failed to load configuration: {}", e)))
    }

    /// Generate default configuration file
    pub fn generate_default_config() -> String {
        let config = Self::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate config file".to_string())
    }
}
