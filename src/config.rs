//! Logger configuration
//!
//! Only the polling behaviour is configurable. Register addresses are part of
//! the hardware revision and live in [`crate::registers`].
//!
//! ```rust
//! use fads_logger::config::{LoggerConfig, SourceMode};
//!
//! let config = LoggerConfig::from_yaml_str("source: snapshot\nidle_backoff_us: 20\n")?;
//! assert_eq!(config.source, SourceMode::Snapshot);
//! config.validate()?;
//! # Ok::<(), fads_logger::TelemetryError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::providers::MAX_IDLE_BACKOFF;
use crate::registers::DEV_MEM;
use crate::{Result, TelemetryError};

/// Where event records are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Drain the FPGA ring buffer
    #[default]
    Ring,
    /// Sample the latest-event registers
    Snapshot,
}

/// Settings for a logging run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    /// Event source
    pub source: SourceMode,

    /// Pause after a poll that found nothing new, in microseconds. Zero
    /// busy-polls.
    pub idle_backoff_us: u64,

    /// Memory device the register window is mapped from
    pub device: PathBuf,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { source: SourceMode::Ring, idle_backoff_us: 0, device: PathBuf::from(DEV_MEM) }
    }
}

impl LoggerConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml)
            .map_err(|e| TelemetryError::parse_error("logger configuration", e.to_string()))
    }

    /// Load a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            TelemetryError::config_error(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Check the settings against the hardware's timing limits.
    pub fn validate(&self) -> Result<()> {
        if self.idle_backoff() > MAX_IDLE_BACKOFF {
            return Err(TelemetryError::config_error(format!(
                "idle backoff {}us exceeds the {}us limit",
                self.idle_backoff_us,
                MAX_IDLE_BACKOFF.as_micros()
            )));
        }
        if self.device.as_os_str().is_empty() {
            return Err(TelemetryError::config_error("device path is empty"));
        }
        Ok(())
    }

    pub fn idle_backoff(&self) -> Duration {
        Duration::from_micros(self.idle_backoff_us)
    }
}
