//! Raster drawing of subnet plots.
//!
//! Channels are stacked top to bottom in configured order. Each band shows the
//! de-meaned waveform as a per-column min/max envelope, scaled to the band's
//! own peak amplitude. Channels without data are filled with the no-data
//! colour.

use chrono::{DateTime, Duration, Utc};
use image::{Rgb, RgbImage};

use pensive_core::types::{ChannelTrace, SampleBuffer};

/// Fill colour of a channel band without data.
pub const NO_DATA_COLOR: Rgb<u8> = Rgb([160, 41, 41]);

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const WAVE: Rgb<u8> = Rgb([0, 0, 0]);
const FRAME: Rgb<u8> = Rgb([128, 128, 128]);
const TICK: Rgb<u8> = Rgb([200, 200, 200]);

/// Height of the top and bottom decoration strips on full-size plots.
pub const LABEL_HEIGHT: u32 = 35;

/// Size and decoration of one plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotGeometry {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Height reserved above and below the channel bands.
    pub margin: u32,
}

impl PlotGeometry {
    /// Full-size plot with decoration strips.
    pub fn full(width: u32, height: u32) -> Self {
        let margin = if height > 4 * LABEL_HEIGHT {
            LABEL_HEIGHT
        } else {
            0
        };
        Self {
            width,
            height,
            margin,
        }
    }

    /// Thumbnail without decoration.
    pub fn thumbnail(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            margin: 0,
        }
    }

    /// Vertical extent `(top, height)` of band `index` out of `count`.
    pub fn band(&self, index: usize, count: usize) -> (u32, u32) {
        let usable = self.height.saturating_sub(2 * self.margin);
        let band_height = usable / count.max(1) as u32;
        (self.margin + index as u32 * band_height, band_height)
    }
}

/// Draw one subnet window.
pub fn draw(
    traces: &[ChannelTrace],
    window_start: DateTime<Utc>,
    window: Duration,
    geometry: PlotGeometry,
) -> RgbImage {
    let mut image = RgbImage::from_pixel(geometry.width, geometry.height, BACKGROUND);

    if geometry.margin > 0 {
        draw_minute_ticks(&mut image, window_start, window, geometry);
    }

    for (index, trace) in traces.iter().enumerate() {
        let (top, height) = geometry.band(index, traces.len());
        if height == 0 {
            continue;
        }
        match trace.data.as_ref().filter(|data| !data.is_empty()) {
            Some(data) => draw_wave(&mut image, &data.demeaned(), window_start, window, top, height),
            None => fill_rows(&mut image, top, height, NO_DATA_COLOR),
        }
        draw_row(&mut image, top, FRAME);
    }

    image
}

fn draw_wave(
    image: &mut RgbImage,
    data: &SampleBuffer,
    window_start: DateTime<Utc>,
    window: Duration,
    top: u32,
    height: u32,
) {
    let width = image.width();
    let columns = column_envelopes(data, window_start, window, width);

    let peak = columns
        .iter()
        .flatten()
        .map(|(min, max)| min.abs().max(max.abs()))
        .fold(0.0_f64, f64::max);
    let scale = if peak > 0.0 { peak } else { 1.0 };

    let mid = top as f64 + height as f64 / 2.0;
    let half = (height as f64 / 2.0 - 1.0).max(0.0);
    let bottom = (top + height).saturating_sub(1);
    let to_row = |value: f64| -> u32 {
        let y = (mid - value / scale * half).round();
        (y.max(top as f64) as u32).min(bottom)
    };

    for (x, envelope) in columns.iter().enumerate() {
        let Some((min, max)) = envelope else {
            continue;
        };
        let (y0, y1) = (to_row(*max), to_row(*min));
        for y in y0..=y1 {
            image.put_pixel(x as u32, y, WAVE);
        }
    }
}

/// Min/max of the samples falling in each pixel column, `None` for columns
/// with no samples.
pub fn column_envelopes(
    data: &SampleBuffer,
    window_start: DateTime<Utc>,
    window: Duration,
    width: u32,
) -> Vec<Option<(f64, f64)>> {
    let window_secs = window.num_milliseconds() as f64 / 1000.0;
    let offset_secs = (window_start - data.start).num_milliseconds() as f64 / 1000.0;
    let len = data.samples.len() as f64;
    let index_at = |column: u32| -> usize {
        let t = offset_secs + window_secs * column as f64 / width.max(1) as f64;
        (t * data.sample_rate).floor().clamp(0.0, len) as usize
    };

    (0..width)
        .map(|x| {
            let (start, end) = (index_at(x), index_at(x + 1));
            data.samples[start..end.max(start)]
                .iter()
                .filter(|s| !s.is_nan())
                .fold(None, |acc: Option<(f64, f64)>, &s| match acc {
                    Some((min, max)) => Some((min.min(s), max.max(s))),
                    None => Some((s, s)),
                })
        })
        .collect()
}

fn draw_minute_ticks(
    image: &mut RgbImage,
    window_start: DateTime<Utc>,
    window: Duration,
    geometry: PlotGeometry,
) {
    let window_ms = window.num_milliseconds();
    if window_ms <= 0 {
        return;
    }
    let first = 60_000 - window_start.timestamp_millis().rem_euclid(60_000);
    let bottom = geometry.height - geometry.margin;
    let mut offset = first % 60_000;
    while offset < window_ms {
        let x = (offset as f64 / window_ms as f64 * geometry.width as f64) as u32;
        if x < geometry.width {
            for y in geometry.margin..bottom {
                image.put_pixel(x, y, TICK);
            }
        }
        offset += 60_000;
    }
}

fn fill_rows(image: &mut RgbImage, top: u32, height: u32, color: Rgb<u8>) {
    let bottom = (top + height).min(image.height());
    for y in top..bottom {
        draw_row(image, y, color);
    }
}

fn draw_row(image: &mut RgbImage, y: u32, color: Rgb<u8>) {
    if y >= image.height() {
        return;
    }
    for x in 0..image.width() {
        image.put_pixel(x, y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pensive_core::types::ChannelId;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(600, 0).unwrap()
    }

    fn sine(rate: f64, seconds: usize) -> SampleBuffer {
        let samples = (0..(rate as usize * seconds))
            .map(|i| (i as f64 / 5.0).sin() * 100.0 + 1000.0)
            .collect();
        SampleBuffer::new(start(), rate, samples)
    }

    fn channel(name: &str) -> ChannelId {
        name.parse().unwrap()
    }

    #[test]
    fn test_band_geometry() {
        let g = PlotGeometry::full(576, 756);
        assert_eq!(g.band(0, 2), (35, 343));
        assert_eq!(g.band(1, 2), (378, 343));

        let t = PlotGeometry::thumbnail(151, 198);
        assert_eq!(t.band(2, 3), (132, 66));
    }

    #[test]
    fn test_column_envelopes_cover_window() {
        let data = sine(10.0, 60).demeaned();
        let columns = column_envelopes(&data, start(), Duration::seconds(60), 60);
        assert_eq!(columns.len(), 60);
        assert!(columns.iter().all(Option::is_some));
    }

    #[test]
    fn test_column_envelopes_leave_gaps_empty() {
        let mut data = sine(1.0, 10);
        for s in &mut data.samples[3..6] {
            *s = f64::NAN;
        }
        let columns = column_envelopes(&data, start(), Duration::seconds(10), 10);
        assert!(columns[2].is_some());
        assert!(columns[4].is_none());
        assert!(columns[7].is_some());
    }

    #[test]
    fn test_no_data_band_is_filled() {
        let traces = vec![
            ChannelTrace::with_data(channel("A EHZ AV"), sine(10.0, 60)),
            ChannelTrace::no_data(channel("B EHZ AV")),
        ];
        let geometry = PlotGeometry::thumbnail(60, 40);
        let image = draw(&traces, start(), Duration::seconds(60), geometry);

        assert_eq!(*image.get_pixel(30, 30), NO_DATA_COLOR);
        assert!(image.enumerate_pixels().take(60 * 20).any(|(_, _, p)| *p == WAVE));
    }
}
