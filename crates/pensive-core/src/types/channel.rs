//! Station/channel/network/location identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Identifies one seismic channel.
///
/// Parsed from `"STA CHA NET [LOC]"`; underscores may stand in for spaces so
/// identifiers survive config formats that dislike whitespace. A location of
/// `--` is the same as no location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId {
    /// Station code.
    pub station: String,
    /// Channel code.
    pub channel: String,
    /// Network code.
    pub network: String,
    /// Location code, if any.
    pub location: Option<String>,
}

impl ChannelId {
    /// Location code as sent to services that want `--` for "none".
    pub fn location_or_dashes(&self) -> &str {
        self.location.as_deref().unwrap_or("--")
    }

    /// Name safe for use in file names.
    pub fn file_stem(&self) -> String {
        self.to_string().replace(' ', "_")
    }
}

impl FromStr for ChannelId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('_', " ");
        let parts: Vec<&str> = normalized.split_whitespace().collect();

        if parts.len() < 3 || parts.len() > 4 {
            return Err(AppError::validation(format!(
                "Channel '{s}' must look like 'STA CHA NET [LOC]'"
            )));
        }

        let location = parts
            .get(3)
            .filter(|loc| **loc != "--")
            .map(|loc| (*loc).to_string());

        Ok(Self {
            station: parts[0].to_string(),
            channel: parts[1].to_string(),
            network: parts[2].to_string(),
            location,
        })
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.station, self.channel, self.network)?;
        if let Some(location) = &self.location {
            write!(f, " {location}")?;
        }
        Ok(())
    }
}
