//! Per-channel sample data files.
//!
//! Each line is `timestamp,value` for one sample inside the plotted window.
//! Files are appended to, so a daily suffix format collects a day of windows.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use pensive_core::error::{AppError, ErrorKind};
use pensive_core::result::AppResult;
use pensive_core::types::SampleBuffer;

/// CSV lines for the samples of `data` inside `[t1, t2)`. Gaps are skipped.
pub fn to_csv(data: &SampleBuffer, t1: DateTime<Utc>, t2: DateTime<Utc>) -> String {
    let mut out = String::new();
    for (index, value) in data.samples.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        let t = data.time_of(index);
        if t < t1 || t >= t2 {
            continue;
        }
        out.push_str(&t.to_rfc3339_opts(SecondsFormat::Millis, true));
        out.push(',');
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out
}

/// Append `csv` to the file at `path`, creating parents as needed.
pub async fn append(path: &Path, csv: &str) -> AppResult<()> {
    if csv.is_empty() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create data directory: {}", parent.display()),
                e,
            )
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to open data file: {}", path.display()),
                e,
            )
        })?;

    file.write_all(csv.as_bytes()).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to append data file: {}", path.display()),
            e,
        )
    })?;
    file.flush().await?;

    debug!(path = %path.display(), bytes = csv.len(), "Appended sample data");
    Ok(())
}
