//! Scheduling and worker loop configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which window a realtime pass plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealtimeWindow {
    /// The most recently completed window.
    #[default]
    Current,
    /// The window before the most recently completed one, to pick up late data.
    OneBehind,
}

/// Global scheduling configuration shared by every data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Length of one plot window in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// Which window a realtime pass produces.
    #[serde(default)]
    pub realtime_window: RealtimeWindow,
    /// Longest a worker waits on an empty queue before re-checking its stop flag.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Pause after requeueing a job that is not yet due.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Optional bound on each source's queue. Unbounded when absent.
    #[serde(default)]
    pub queue_capacity: Option<usize>,
}

impl ScheduleConfig {
    /// Window length as a `chrono` duration.
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.window_seconds as i64)
    }

    /// Queue poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Backoff after requeueing a job that is not yet due.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            realtime_window: RealtimeWindow::default(),
            poll_interval_ms: default_poll_interval(),
            retry_delay_ms: default_retry_delay(),
            queue_capacity: None,
        }
    }
}

fn default_window_seconds() -> u64 {
    600
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_retry_delay() -> u64 {
    1000
}
