//! Upstream data source configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Protocol spoken by an upstream data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// FDSN-style HTTP time-series service returning GeoCSV.
    Timeseries,
}

/// One upstream data source. Each gets its own scheduler and worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Protocol of this source.
    #[serde(default = "default_kind")]
    pub kind: SourceKind,
    /// Base URL of the service query endpoint.
    pub url: String,
    /// Optional user for restricted data.
    #[serde(default)]
    pub user: Option<String>,
    /// Password paired with `user`.
    #[serde(default)]
    pub password: Option<String>,
    /// Number of worker connections to this source.
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl SourceConfig {
    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_kind() -> SourceKind {
    SourceKind::Timeseries
}

fn default_threads() -> usize {
    5
}

fn default_timeout() -> u64 {
    15
}
