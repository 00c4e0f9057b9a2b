//! Configuration for the ingestion tracking core

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main ingestion configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Backend connection configuration
    #[serde(default)]
    pub backend: BackendConfig,
    /// Batch status polling configuration
    #[serde(default)]
    pub polling: PollingConfig,
    /// Completion reconciliation configuration
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    /// Silent library refresh configuration
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl IngestConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the document processing backend
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Batch status polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Fixed polling period in milliseconds
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
    /// Consecutive fetch failures tolerated before tracking is declared lost
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// Wall-clock ceiling for tracking a single batch, in seconds
    #[serde(default = "default_wall_clock_timeout")]
    pub wall_clock_timeout_secs: u64,
}

impl PollingConfig {
    /// Polling period as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Wall-clock ceiling as a [`Duration`]
    pub fn wall_clock_timeout(&self) -> Duration {
        Duration::from_secs(self.wall_clock_timeout_secs)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            max_consecutive_failures: default_max_consecutive_failures(),
            wall_clock_timeout_secs: default_wall_clock_timeout(),
        }
    }
}

/// Completion reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Delay before transient batch/progress state is cleared, in milliseconds.
    /// Long enough for the user to read the outcome before it disappears.
    #[serde(default = "default_clear_delay")]
    pub clear_delay_ms: u64,
}

impl ReconcileConfig {
    /// Deferred-clear delay as a [`Duration`]
    pub fn clear_delay(&self) -> Duration {
        Duration::from_millis(self.clear_delay_ms)
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            clear_delay_ms: default_clear_delay(),
        }
    }
}

/// Silent library refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Period for the background refresh loop in seconds
    #[serde(default = "default_refresh_interval")]
    pub interval_secs: u64,
}

impl RefreshConfig {
    /// Refresh period as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_refresh_interval(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_request_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    500
}
fn default_max_consecutive_failures() -> u32 {
    10
}
fn default_wall_clock_timeout() -> u64 {
    600
}
fn default_clear_delay() -> u64 {
    3000
}
fn default_refresh_interval() -> u64 {
    30
}
