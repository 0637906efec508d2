//! Window boundary arithmetic.
//!
//! Windows are aligned to multiples of their duration in Unix epoch time, so
//! every subnet with the same window length shares the same boundaries.

use chrono::{DateTime, Duration, Utc};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Round `t` down to the nearest window boundary.
pub fn floor_to_window(t: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    t - offset_into_window(t, window)
}

/// Round `t` up to the nearest window boundary. Boundaries map to themselves.
pub fn ceil_to_window(t: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    let remainder = offset_into_window(t, window);
    if remainder == Duration::zero() {
        t
    } else {
        t + (window - remainder)
    }
}

/// The first boundary strictly after `t`.
pub fn next_boundary(t: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    floor_to_window(t, window) + window
}

/// Distance from the previous boundary, exact to the nanosecond.
fn offset_into_window(t: DateTime<Utc>, window: Duration) -> Duration {
    let window_ns = total_nanos(window).max(1);
    let t_ns = i128::from(t.timestamp()) * NANOS_PER_SECOND + i128::from(t.timestamp_subsec_nanos());
    let remainder = t_ns.rem_euclid(window_ns);

    // remainder < window, so both parts fit an i64
    Duration::seconds((remainder / NANOS_PER_SECOND) as i64)
        + Duration::nanoseconds((remainder % NANOS_PER_SECOND) as i64)
}

fn total_nanos(d: Duration) -> i128 {
    d.num_nanoseconds()
        .map(i128::from)
        .unwrap_or_else(|| i128::from(d.num_seconds()) * NANOS_PER_SECOND)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_floor() {
        let w = Duration::seconds(600);
        assert_eq!(floor_to_window(at(1000), w), at(600));
        assert_eq!(floor_to_window(at(600), w), at(600));
        assert_eq!(floor_to_window(at(599), w), at(0));
    }

    #[test]
    fn test_ceil() {
        let w = Duration::seconds(600);
        assert_eq!(ceil_to_window(at(1250), w), at(1800));
        assert_eq!(ceil_to_window(at(1200), w), at(1200));
        assert_eq!(ceil_to_window(at(1), w), at(600));
    }

    #[test]
    fn test_next_boundary_is_strictly_after() {
        let w = Duration::seconds(600);
        assert_eq!(next_boundary(at(50), w), at(600));
        assert_eq!(next_boundary(at(600), w), at(1200));
    }

    #[test]
    fn test_floor_before_epoch() {
        let w = Duration::seconds(600);
        assert_eq!(floor_to_window(at(-1), w), at(-600));
        assert_eq!(floor_to_window(at(-600), w), at(-600));
    }

    #[test]
    fn test_sub_second_offsets() {
        let w = Duration::seconds(600);
        let t = at(1200) + Duration::milliseconds(1);
        assert_eq!(floor_to_window(t, w), at(1200));
        assert_eq!(ceil_to_window(t, w), at(1800));
    }

    #[test]
    fn test_sub_millisecond_offsets_are_dropped() {
        let w = Duration::seconds(600);
        let t = DateTime::from_timestamp(1000, 500).unwrap();
        assert_eq!(floor_to_window(t, w), at(600));
        assert_eq!(ceil_to_window(t, w), at(1200));
        assert_eq!(next_boundary(t, w), at(1200));

        let just_past = DateTime::from_timestamp(1200, 1).unwrap();
        assert_eq!(floor_to_window(just_past, w), at(1200));
        assert_eq!(ceil_to_window(just_past, w), at(1800));

        let before_epoch = DateTime::from_timestamp(-1, 999_999_999).unwrap();
        assert_eq!(floor_to_window(before_epoch, w), at(-600));
    }
}
