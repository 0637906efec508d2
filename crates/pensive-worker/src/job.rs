//! Plot jobs.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use pensive_core::config::RealtimeWindow;
use pensive_core::types::window::floor_to_window;

use crate::subnet::Subnet;

/// A request to plot one subnet for one window.
///
/// The window is `[window_end - duration, window_end)`. The job must not run
/// before `not_before`, which is `window_end` plus the subnet's embargo.
#[derive(Debug, Clone)]
pub struct PlotJob {
    /// Job identifier, for logging.
    pub id: Uuid,
    /// Subnet to plot.
    pub subnet: Arc<Subnet>,
    /// End of the window.
    pub window_end: DateTime<Utc>,
    /// Earliest time the job may run.
    pub not_before: DateTime<Utc>,
}

impl PlotJob {
    /// Job for an explicit window end.
    pub fn at(subnet: Arc<Subnet>, window_end: DateTime<Utc>) -> Self {
        let not_before = window_end + subnet.embargo().max(Duration::zero());
        Self {
            id: Uuid::new_v4(),
            subnet,
            window_end,
            not_before,
        }
    }

    /// Job for the most recently completed window as of `now`, or the one
    /// before it.
    pub fn realtime(
        subnet: Arc<Subnet>,
        now: DateTime<Utc>,
        window: Duration,
        choice: RealtimeWindow,
    ) -> Self {
        let mut window_end = floor_to_window(now, window);
        if choice == RealtimeWindow::OneBehind {
            window_end -= window;
        }
        Self::at(subnet, window_end)
    }

    /// Whether the job may run at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.not_before
    }
}

/// Jobs compare by `not_before` only.
impl PartialEq for PlotJob {
    fn eq(&self, other: &Self) -> bool {
        self.not_before == other.not_before
    }
}

impl Eq for PlotJob {}

impl PartialOrd for PlotJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PlotJob {
    fn cmp(&self, other: &Self) -> Ordering {
        self.not_before.cmp(&other.not_before)
    }
}
