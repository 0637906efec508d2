//! Network and subnet configuration.

use serde::{Deserialize, Serialize};

/// A named network grouping one or more subnets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network name, used as the first path component of its plots.
    pub name: String,
    /// Subnets in plotting order.
    #[serde(default)]
    pub subnets: Vec<SubnetConfig>,
}

/// A subnet: a set of channels plotted together as one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubnetConfig {
    /// Subnet name.
    pub name: String,
    /// Name of the `[sources.*]` entry feeding this subnet.
    #[serde(default)]
    pub data_source: Option<String>,
    /// Seconds to wait after a window closes before plotting it.
    #[serde(default = "default_embargo")]
    pub embargo_seconds: u64,
    /// Channel identifiers, top to bottom.
    #[serde(default)]
    pub channels: Vec<String>,
}

impl SubnetConfig {
    /// Embargo as a `chrono` duration.
    pub fn embargo(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.embargo_seconds as i64)
    }
}

fn default_embargo() -> u64 {
    5
}
