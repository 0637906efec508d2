//! GeoCSV time-series response parsing.
//!
//! A response holds one or more segments. Each segment starts with `#`
//! header lines (`sample_rate_hz`, `start_time`, ...) followed by one sample
//! per line, either bare (`slist`) or as `time, value` pairs (`tspair`).

use chrono::{DateTime, Duration, Utc};

use pensive_core::error::AppError;
use pensive_core::result::AppResult;
use pensive_core::types::SampleBuffer;

#[derive(Debug, Default)]
struct Segment {
    start: Option<DateTime<Utc>>,
    sample_rate: Option<f64>,
    samples: Vec<f64>,
}

impl Segment {
    fn finish(self) -> AppResult<Option<SampleBuffer>> {
        if self.samples.is_empty() {
            return Ok(None);
        }
        let start = self
            .start
            .ok_or_else(|| AppError::validation("GeoCSV segment has no start_time header"))?;
        let sample_rate = self
            .sample_rate
            .filter(|rate| *rate > 0.0)
            .ok_or_else(|| AppError::validation("GeoCSV segment has no usable sample_rate_hz"))?;
        Ok(Some(SampleBuffer::new(start, sample_rate, self.samples)))
    }
}

/// Parse a GeoCSV body into a single buffer covering at most `[t1, t2)`.
///
/// Samples outside the requested range are dropped. The remaining segments
/// are placed on the first segment's time base; gaps between them become
/// `NaN`. Returns `Ok(None)` when no samples fall inside the range.
pub fn parse(body: &str, t1: DateTime<Utc>, t2: DateTime<Utc>) -> AppResult<Option<SampleBuffer>> {
    let mut segments = Vec::new();
    let mut current = Segment::default();

    for raw in body.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('#') {
            if !current.samples.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
            apply_header(&mut current, header)?;
            continue;
        }

        let value = line.rsplit(',').next().unwrap_or(line).trim();
        if let Ok(sample) = value.parse::<f64>() {
            current.samples.push(sample);
        }
    }
    segments.push(current);

    let mut buffers = Vec::new();
    for segment in segments {
        if let Some(buffer) = segment.finish()?.and_then(|b| clip(b, t1, t2)) {
            buffers.push(buffer);
        }
    }
    Ok(merge(buffers))
}

fn apply_header(segment: &mut Segment, header: &str) -> AppResult<()> {
    let Some((key, value)) = header.split_once(':') else {
        return Ok(());
    };
    let value = value.trim();
    match key.trim() {
        "sample_rate_hz" => {
            let rate = value.parse::<f64>().map_err(|e| {
                AppError::validation(format!("Bad sample_rate_hz '{value}': {e}"))
            })?;
            segment.sample_rate = Some(rate);
        }
        "start_time" => {
            let start = DateTime::parse_from_rfc3339(value)
                .map_err(|e| AppError::validation(format!("Bad start_time '{value}': {e}")))?;
            segment.start = Some(start.with_timezone(&Utc));
        }
        _ => {}
    }
    Ok(())
}

/// Seconds from `from` to `to`, or `None` when too far apart to represent.
fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> Option<f64> {
    (to - from)
        .num_microseconds()
        .map(|micros| micros as f64 / 1_000_000.0)
}

/// Keep only the samples whose time falls in `[t1, t2)`.
fn clip(buffer: SampleBuffer, t1: DateTime<Utc>, t2: DateTime<Utc>) -> Option<SampleBuffer> {
    let len = buffer.samples.len() as f64;
    let rate = buffer.sample_rate;

    // Index bounds are compared as floats so far-off headers never reach a cast.
    let first = (seconds_between(buffer.start, t1)? * rate).ceil().clamp(0.0, len);
    let end = (seconds_between(buffer.start, t2)? * rate).ceil().clamp(0.0, len);
    if first >= end {
        return None;
    }

    let (first, end) = (first as usize, end as usize);
    let shift = Duration::microseconds((first as f64 / rate * 1_000_000.0).round() as i64);
    let SampleBuffer { start, samples, .. } = buffer;
    Some(SampleBuffer::new(start + shift, rate, samples[first..end].to_vec()))
}

fn merge(buffers: Vec<SampleBuffer>) -> Option<SampleBuffer> {
    let mut iter = buffers.into_iter();
    let mut merged = iter.next()?;

    for buffer in iter {
        let Some(offset_secs) = seconds_between(merged.start, buffer.start) else {
            continue;
        };
        let offset = (offset_secs * merged.sample_rate).round();
        if offset < 0.0 {
            continue;
        }
        let offset = offset as usize;
        let needed = offset + buffer.samples.len();
        if merged.samples.len() < needed {
            merged.samples.resize(needed, f64::NAN);
        }
        merged.samples[offset..needed].copy_from_slice(&buffer.samples);
    }

    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
    }

    fn hour() -> (DateTime<Utc>, DateTime<Utc>) {
        (t("2024-01-01T00:00:00Z"), t("2024-01-01T01:00:00Z"))
    }

    fn parse_hour(body: &str) -> AppResult<Option<SampleBuffer>> {
        let (t1, t2) = hour();
        parse(body, t1, t2)
    }

    const SLIST: &str = "\
# dataset: GeoCSV 2.0
# delimiter: ,
# SID: AV_SPCP__BHZ
# sample_count: 4
# sample_rate_hz: 2
# start_time: 2024-01-01T00:00:00.000000Z
# field_unit: COUNTS
# field_type: INTEGER
Sample
10
12
-3
7
";

    #[test]
    fn test_parse_single_segment() {
        let buffer = parse_hour(SLIST).unwrap().unwrap();
        assert_eq!(buffer.sample_rate, 2.0);
        assert_eq!(buffer.samples, vec![10.0, 12.0, -3.0, 7.0]);
        assert_eq!(buffer.start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_tspair_takes_last_field() {
        let body = "\
# sample_rate_hz: 1
# start_time: 2024-01-01T00:00:00Z
Time, Sample
2024-01-01T00:00:00Z, 5
2024-01-01T00:00:01Z, 6
";
        let buffer = parse_hour(body).unwrap().unwrap();
        assert_eq!(buffer.samples, vec![5.0, 6.0]);
    }

    #[test]
    fn test_parse_merges_segments_with_gap() {
        let body = "\
# sample_rate_hz: 1
# start_time: 2024-01-01T00:00:00Z
1
2
# sample_rate_hz: 1
# start_time: 2024-01-01T00:00:04Z
5
6
";
        let buffer = parse_hour(body).unwrap().unwrap();
        assert_eq!(buffer.len(), 6);
        assert_eq!(buffer.samples[0], 1.0);
        assert!(buffer.samples[2].is_nan());
        assert!(buffer.samples[3].is_nan());
        assert_eq!(buffer.samples[4], 5.0);
        assert_eq!(buffer.samples[5], 6.0);
    }

    #[test]
    fn test_parse_empty_body_is_no_data() {
        assert!(parse_hour("").unwrap().is_none());
        assert!(parse_hour("# sample_rate_hz: 1\n").unwrap().is_none());
    }

    #[test]
    fn test_parse_rejects_missing_start() {
        let body = "# sample_rate_hz: 1\n1\n2\n";
        assert!(parse_hour(body).is_err());
    }

    #[test]
    fn test_parse_clips_to_requested_range() {
        let body = "\
# sample_rate_hz: 1
# start_time: 2023-12-31T23:59:58Z
1
2
3
4
";
        let t1 = t("2024-01-01T00:00:00Z");
        let buffer = parse(body, t1, t1 + Duration::seconds(1)).unwrap().unwrap();
        assert_eq!(buffer.samples, vec![3.0]);
        assert_eq!(buffer.start, t1);
    }

    #[test]
    fn test_parse_ignores_far_off_segment() {
        let body = "\
# sample_rate_hz: 1000000
# start_time: 2024-01-01T00:00:00Z
1
2
# sample_rate_hz: 1000000
# start_time: 2200-01-01T00:00:00Z
3
4
";
        let buffer = parse_hour(body).unwrap().unwrap();
        assert_eq!(buffer.samples, vec![1.0, 2.0]);
    }

    #[test]
    fn test_parse_outside_range_is_no_data() {
        let body = "\
# sample_rate_hz: 1
# start_time: 2024-01-02T00:00:00Z
1
";
        assert!(parse_hour(body).unwrap().is_none());
    }
}
