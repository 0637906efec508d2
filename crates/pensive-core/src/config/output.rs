//! Plot output configuration.

use serde::{Deserialize, Serialize};

/// Where and how plot files are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory of the plot tree.
    #[serde(default = "default_path_root")]
    pub path_root: String,
    /// `chrono` format string for the dated directory below `network/subnet`.
    #[serde(default = "default_file_path_format")]
    pub file_path_format: String,
    /// `chrono` format string appended to the subnet name in file names.
    #[serde(default = "default_file_suffix_format")]
    pub file_suffix_format: String,
    /// Full plot width in pixels.
    #[serde(default = "default_plot_width")]
    pub plot_width: u32,
    /// Full plot height in pixels.
    #[serde(default = "default_plot_height")]
    pub plot_height: u32,
    /// Thumbnail width in pixels.
    #[serde(default = "default_thumb_width")]
    pub thumb_width: u32,
    /// Thumbnail height in pixels.
    #[serde(default = "default_thumb_height")]
    pub thumb_height: u32,
    /// Append raw samples of each channel to a dated `.dat` file.
    #[serde(default)]
    pub write_data: bool,
    /// `chrono` format string appended to the channel name in data file names.
    #[serde(default = "default_data_suffix_format")]
    pub data_suffix_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path_root: default_path_root(),
            file_path_format: default_file_path_format(),
            file_suffix_format: default_file_suffix_format(),
            plot_width: default_plot_width(),
            plot_height: default_plot_height(),
            thumb_width: default_thumb_width(),
            thumb_height: default_thumb_height(),
            write_data: false,
            data_suffix_format: default_data_suffix_format(),
        }
    }
}

fn default_path_root() -> String {
    "html".to_string()
}

fn default_file_path_format() -> String {
    "%Y/%j".to_string()
}

fn default_file_suffix_format() -> String {
    "_%Y%m%d-%H%M".to_string()
}

fn default_plot_width() -> u32 {
    576
}

fn default_plot_height() -> u32 {
    756
}

fn default_thumb_width() -> u32 {
    151
}

fn default_thumb_height() -> u32 {
    198
}

fn default_data_suffix_format() -> String {
    "_%Y%m%d".to_string()
}
