//! Output file naming.
//!
//! Every artifact lives under `path_root/network/subnet/<file_path_format>/`,
//! with the directory and suffix parts produced by `strftime` formats applied
//! to the window end time.

use std::fmt::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use pensive_core::config::output::OutputConfig;
use pensive_core::error::AppError;
use pensive_core::result::AppResult;
use pensive_core::traits::render::RenderedPlot;
use pensive_core::types::ChannelId;

/// Resolves artifact paths for plots and data files.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    /// Root directory for all output.
    root: PathBuf,
    /// Format of the dated directory below each subnet.
    file_path_format: String,
    /// Format appended to the subnet name in plot file names.
    file_suffix_format: String,
    /// Format appended to the channel name in data file names.
    data_suffix_format: String,
}

impl OutputLayout {
    /// Build a layout from output configuration, rejecting unusable formats.
    pub fn new(config: &OutputConfig) -> AppResult<Self> {
        let layout = Self {
            root: PathBuf::from(&config.path_root),
            file_path_format: config.file_path_format.clone(),
            file_suffix_format: config.file_suffix_format.clone(),
            data_suffix_format: config.data_suffix_format.clone(),
        };

        let probe = Utc::now();
        format_time(&layout.file_path_format, probe)?;
        format_time(&layout.file_suffix_format, probe)?;
        format_time(&layout.data_suffix_format, probe)?;

        Ok(layout)
    }

    /// Root directory for all output.
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Directory holding the artifacts of one subnet window.
    pub fn directory(
        &self,
        network: &str,
        subnet: &str,
        window_end: DateTime<Utc>,
    ) -> AppResult<PathBuf> {
        let dated = format_time(&self.file_path_format, window_end)?;
        let mut dir = self.root.clone();
        if !network.is_empty() {
            dir.push(network);
        }
        dir.push(subnet);
        dir.extend(dated.split('/').filter(|part| !part.is_empty()));
        Ok(dir)
    }

    /// Full-size and thumbnail PNG paths for one subnet window.
    pub fn plot_paths(
        &self,
        network: &str,
        subnet: &str,
        window_end: DateTime<Utc>,
    ) -> AppResult<RenderedPlot> {
        let dir = self.directory(network, subnet, window_end)?;
        let base = format!(
            "{subnet}{}",
            format_time(&self.file_suffix_format, window_end)?
        );
        Ok(RenderedPlot {
            full: dir.join(format!("{base}.png")),
            thumbnail: dir.join(format!("{base}_thumb.png")),
        })
    }

    /// Data file one channel's samples are appended to.
    pub fn data_path(
        &self,
        network: &str,
        subnet: &str,
        channel: &ChannelId,
        window_end: DateTime<Utc>,
    ) -> AppResult<PathBuf> {
        let dir = self.directory(network, subnet, window_end)?;
        let name = format!(
            "{}{}.dat",
            channel.file_stem(),
            format_time(&self.data_suffix_format, window_end)?
        );
        Ok(dir.join(name.split_whitespace().collect::<Vec<_>>().join("_")))
    }
}

fn format_time(format: &str, t: DateTime<Utc>) -> AppResult<String> {
    let mut out = String::new();
    write!(out, "{}", t.format(format))
        .map_err(|_| AppError::configuration(format!("Invalid time format '{format}'")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> OutputLayout {
        OutputLayout::new(&OutputConfig {
            path_root: "html".to_string(),
            ..OutputConfig::default()
        })
        .unwrap()
    }

    fn window_end() -> DateTime<Utc> {
        // 2024-02-01 12:30 UTC, day 032
        DateTime::from_timestamp(1_706_790_600, 0).unwrap()
    }

    #[test]
    fn test_plot_paths() {
        let paths = layout().plot_paths("AV", "Spurr", window_end()).unwrap();
        assert_eq!(
            paths.full,
            PathBuf::from("html/AV/Spurr/2024/032/Spurr_20240201-1230.png")
        );
        assert_eq!(
            paths.thumbnail,
            PathBuf::from("html/AV/Spurr/2024/032/Spurr_20240201-1230_thumb.png")
        );
    }

    #[test]
    fn test_data_path() {
        let channel: ChannelId = "SPCP BHZ AV".parse().unwrap();
        let path = layout()
            .data_path("AV", "Spurr", &channel, window_end())
            .unwrap();
        assert_eq!(
            path,
            PathBuf::from("html/AV/Spurr/2024/032/SPCP_BHZ_AV_20240201.dat")
        );
    }

    #[test]
    fn test_rejects_invalid_format() {
        let config = OutputConfig {
            file_suffix_format: "_%Q".to_string(),
            ..OutputConfig::default()
        };
        assert!(OutputLayout::new(&config).is_err());
    }
}
