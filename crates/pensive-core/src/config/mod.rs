//! Application configuration schemas.
//!
//! All configuration structs are deserialized from a TOML file via the
//! `config` crate, overlaid with `PENSIVE__`-prefixed environment variables.
//! Each sub-module represents a logical configuration section.

pub mod logging;
pub mod network;
pub mod output;
pub mod schedule;
pub mod source;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::network::NetworkConfig;
use self::output::OutputConfig;
use self::schedule::ScheduleConfig;
use self::source::SourceConfig;

use crate::error::AppError;

pub use self::network::SubnetConfig;
pub use self::schedule::RealtimeWindow;
pub use self::source::SourceKind;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Window length, realtime window choice, and worker loop timing.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Plot file layout and image sizes.
    #[serde(default)]
    pub output: OutputConfig,
    /// Upstream data sources keyed by name.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
    /// Networks in plotting order.
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables prefixed with `PENSIVE__` override file values,
    /// e.g. `PENSIVE__SCHEDULE__WINDOW_SECONDS=300`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(
                config::Environment::with_prefix("PENSIVE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                AppError::configuration(format!(
                    "Failed to read config '{}': {e}",
                    path.display()
                ))
            })?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values no scheduler can run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.schedule.window_seconds == 0 {
            return Err(AppError::validation("schedule.window_seconds must be positive"));
        }
        if self.schedule.queue_capacity == Some(0) {
            return Err(AppError::validation("schedule.queue_capacity must be positive"));
        }
        for (name, source) in &self.sources {
            if source.threads == 0 {
                return Err(AppError::validation(format!(
                    "sources.{name}.threads must be at least 1"
                )));
            }
        }
        let output = &self.output;
        if output.plot_width == 0
            || output.plot_height == 0
            || output.thumb_width == 0
            || output.thumb_height == 0
        {
            return Err(AppError::validation("plot and thumbnail sizes must be positive"));
        }
        Ok(())
    }
}
