//! Sample buffers returned by upstream sources.

use chrono::{DateTime, Duration, Utc};

use super::channel::ChannelId;

/// Evenly sampled data for one channel.
///
/// Gaps are represented by `NaN` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Time of the first sample.
    pub start: DateTime<Utc>,
    /// Samples per second.
    pub sample_rate: f64,
    /// Sample values.
    pub samples: Vec<f64>,
}

impl SampleBuffer {
    /// Create a buffer.
    pub fn new(start: DateTime<Utc>, sample_rate: f64, samples: Vec<f64>) -> Self {
        Self {
            start,
            sample_rate,
            samples,
        }
    }

    /// Number of samples, gaps included.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when there is nothing to plot.
    pub fn is_empty(&self) -> bool {
        self.samples.iter().all(|s| s.is_nan())
    }

    /// Time of the sample at `index`.
    pub fn time_of(&self, index: usize) -> DateTime<Utc> {
        let micros = (index as f64 / self.sample_rate * 1_000_000.0).round() as i64;
        self.start + Duration::microseconds(micros)
    }

    /// Time just past the last sample.
    pub fn end(&self) -> DateTime<Utc> {
        self.time_of(self.samples.len())
    }

    /// Mean of the non-gap samples.
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .samples
            .iter()
            .filter(|s| !s.is_nan())
            .fold((0.0, 0usize), |(sum, count), s| (sum + s, count + 1));
        (count > 0).then(|| sum / count as f64)
    }

    /// Copy with the mean removed, leaving gaps untouched.
    pub fn demeaned(&self) -> Self {
        let mean = self.mean().unwrap_or(0.0);
        Self {
            start: self.start,
            sample_rate: self.sample_rate,
            samples: self.samples.iter().map(|s| s - mean).collect(),
        }
    }
}

/// One channel's contribution to a subnet plot.
#[derive(Debug, Clone)]
pub struct ChannelTrace {
    /// Which channel.
    pub channel: ChannelId,
    /// Samples for the window, or `None` when the upstream had nothing.
    pub data: Option<SampleBuffer>,
}

impl ChannelTrace {
    /// A trace with samples.
    pub fn with_data(channel: ChannelId, data: SampleBuffer) -> Self {
        Self {
            channel,
            data: Some(data),
        }
    }

    /// A placeholder trace for a channel without data.
    pub fn no_data(channel: ChannelId) -> Self {
        Self {
            channel,
            data: None,
        }
    }

    /// Whether this channel is drawn as "no data".
    pub fn is_no_data(&self) -> bool {
        self.data.as_ref().is_none_or(SampleBuffer::is_empty)
    }
}
