//! Job production policies.
//!
//! A realtime pass yields one job per subnet for the latest window. A
//! backfill pass yields one job per subnet for every window boundary in its
//! range, subnet by subnet.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use pensive_core::config::RealtimeWindow;
use pensive_core::error::AppError;
use pensive_core::result::AppResult;
use pensive_core::types::window::{ceil_to_window, floor_to_window};

use crate::job::PlotJob;
use crate::subnet::Subnet;

/// How a scheduler turns its subnets into jobs on each pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingPolicy {
    /// Plot the latest window as of the pass.
    Realtime {
        /// Current completed window or the one before it.
        window_choice: RealtimeWindow,
    },
    /// Plot every window between `start` and `end`.
    Backfill {
        /// Range start.
        start: DateTime<Utc>,
        /// Range end.
        end: DateTime<Utc>,
    },
}

impl SchedulingPolicy {
    /// Short name for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Realtime { .. } => "realtime",
            Self::Backfill { .. } => "backfill",
        }
    }

    /// Jobs for one pass over `subnets`, in subnet order.
    pub fn produce_pass(
        &self,
        subnets: &[Arc<Subnet>],
        window: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<PlotJob>> {
        if window <= Duration::zero() {
            return Err(AppError::validation("Window length must be positive"));
        }

        match *self {
            Self::Realtime { window_choice } => Ok(subnets
                .iter()
                .map(|subnet| PlotJob::realtime(Arc::clone(subnet), now, window, window_choice))
                .collect()),
            Self::Backfill { start, end } => {
                let ends = backfill_windows(start, end, window)?;
                Ok(subnets
                    .iter()
                    .flat_map(|subnet| ends.iter().map(|end| PlotJob::at(Arc::clone(subnet), *end)))
                    .collect())
            }
        }
    }
}

/// Window ends from the first boundary after `floor(start)` through
/// `ceil(end)`, inclusive.
pub fn backfill_windows(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window: Duration,
) -> AppResult<Vec<DateTime<Utc>>> {
    if window <= Duration::zero() {
        return Err(AppError::validation("Window length must be positive"));
    }
    if end < start {
        return Err(AppError::validation(format!(
            "Backfill end {end} is before start {start}"
        )));
    }

    let first = floor_to_window(start, window) + window;
    let last = ceil_to_window(end, window);

    let mut ends = Vec::new();
    let mut current = first;
    while current <= last {
        ends.push(current);
        current += window;
    }
    Ok(ends)
}
