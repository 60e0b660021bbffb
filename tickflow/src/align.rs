//! Calendar-boundary alignment arithmetic.
//!
//! Snapping works additively by calendar field: the correction subtracted
//! from a timestamp is built from its hour/minute/second/millisecond/
//! microsecond components, where the finest field with a non-zero alignment
//! component keeps the remainder via modulo and every coarser field below
//! the alignment granularity is removed entirely. Subtracting the correction
//! lands on the most recent boundary at or before the input.

use crate::error::TickError;
use chrono::{DateTime, Duration, TimeZone, Timelike};

/// Snaps `dt` to the boundary defined by `alignment`.
///
/// With `round_up` false the result is the most recent boundary at or before
/// `dt`; with `round_up` true, the next boundary at or after `dt`. A zero
/// alignment disables snapping and returns `dt` unchanged. A timestamp that
/// is already exactly on a boundary is returned as-is in both modes.
///
/// The computation reads calendar fields in `dt`'s own timezone, so aligning
/// a zoned timestamp to one day snaps to local midnight, not UTC midnight.
///
/// # Errors
/// Returns [`TickError::NegativeAlignment`] if `alignment` is negative.
pub fn align_datetime<Tz: TimeZone>(
    dt: DateTime<Tz>,
    alignment: Duration,
    round_up: bool,
) -> Result<DateTime<Tz>, TickError> {
    if alignment < Duration::zero() {
        return Err(TickError::NegativeAlignment(alignment));
    }
    Ok(align_unchecked(dt, alignment, round_up))
}

/// Alignment core without the sign check. Callers must have validated that
/// `alignment` is non-negative.
pub(crate) fn align_unchecked<Tz: TimeZone>(
    dt: DateTime<Tz>,
    alignment: Duration,
    round_up: bool,
) -> DateTime<Tz> {
    if alignment.is_zero() {
        return dt;
    }

    let subsec_nanos = i64::from(dt.nanosecond());
    let milli = subsec_nanos / 1_000_000;
    let micro = (subsec_nanos / 1_000) % 1_000;
    let submicro = subsec_nanos % 1_000;

    let hours = if alignment.num_days() > 0 {
        i64::from(dt.hour())
    } else if alignment.num_hours() > 0 {
        i64::from(dt.hour()) % alignment.num_hours()
    } else {
        0
    };
    let minutes = if alignment.num_hours() > 0 {
        i64::from(dt.minute())
    } else if alignment.num_minutes() > 0 {
        i64::from(dt.minute()) % alignment.num_minutes()
    } else {
        0
    };
    let seconds = if alignment.num_minutes() > 0 {
        i64::from(dt.second())
    } else if alignment.num_seconds() > 0 {
        i64::from(dt.second()) % alignment.num_seconds()
    } else {
        0
    };
    let millis = if alignment.num_seconds() > 0 {
        milli
    } else if alignment.num_milliseconds() > 0 {
        milli % alignment.num_milliseconds()
    } else {
        0
    };
    let micros = if alignment.num_milliseconds() > 0 {
        micro
    } else if let Some(unit) = alignment.num_microseconds().filter(|&u| u > 0) {
        micro % unit
    } else {
        0
    };

    let correction = Duration::hours(hours)
        + Duration::minutes(minutes)
        + Duration::seconds(seconds)
        + Duration::milliseconds(millis)
        + Duration::microseconds(micros)
        + Duration::nanoseconds(submicro);

    if correction.is_zero() {
        // Already on a boundary.
        return dt;
    }
    let rounded_down = dt - correction;
    if round_up {
        rounded_down + alignment
    } else {
        rounded_down
    }
}

/// Derives a natural alignment granularity from an interval: one unit of the
/// coarsest non-zero calendar field. A 15-minute interval yields one minute,
/// a 2-hour interval one hour. A zero interval yields zero (no alignment).
///
/// This is the default alignment used by
/// [`PeriodicTriggers::new`](crate::generator::PeriodicTriggers::new).
pub fn alignment_unit(interval: Duration) -> Duration {
    if interval.num_days() > 0 {
        Duration::days(1)
    } else if interval.num_hours() > 0 {
        Duration::hours(1)
    } else if interval.num_minutes() > 0 {
        Duration::minutes(1)
    } else if interval.num_seconds() > 0 {
        Duration::seconds(1)
    } else if interval.num_milliseconds() > 0 {
        Duration::milliseconds(1)
    } else if interval.num_microseconds().is_some_and(|u| u > 0) {
        Duration::microseconds(1)
    } else {
        Duration::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn zero_alignment_is_identity() {
        let t = ts("2026-08-25T12:34:56.789Z");
        assert_eq!(align_datetime(t, Duration::zero(), false).unwrap(), t);
        assert_eq!(align_datetime(t, Duration::zero(), true).unwrap(), t);
    }

    #[test]
    fn negative_alignment_is_rejected() {
        let t = ts("2026-08-25T12:34:56Z");
        let err = align_datetime(t, Duration::seconds(-1), false).unwrap_err();
        assert!(matches!(err, TickError::NegativeAlignment(_)));
    }

    #[test]
    fn aligns_down_to_second() {
        let t = ts("2026-08-25T12:34:56.789123Z");
        let aligned = align_datetime(t, Duration::seconds(1), false).unwrap();
        assert_eq!(aligned, ts("2026-08-25T12:34:56Z"));
    }

    #[test]
    fn aligns_down_to_five_minutes() {
        let t = ts("2026-08-25T12:34:56Z");
        let aligned = align_datetime(t, Duration::minutes(5), false).unwrap();
        assert_eq!(aligned, ts("2026-08-25T12:30:00Z"));
    }

    #[test]
    fn aligns_down_to_midnight_for_day_unit() {
        let t = ts("2026-08-25T23:59:59.999Z");
        let aligned = align_datetime(t, Duration::days(1), false).unwrap();
        assert_eq!(aligned, ts("2026-08-25T00:00:00Z"));
    }

    #[test]
    fn round_up_advances_one_full_unit() {
        let t = ts("2026-08-25T12:34:56.5Z");
        let up = align_datetime(t, Duration::minutes(1), true).unwrap();
        assert_eq!(up, ts("2026-08-25T12:35:00Z"));
    }

    #[test]
    fn round_up_on_boundary_is_identity() {
        let t = ts("2026-08-25T12:35:00Z");
        let up = align_datetime(t, Duration::minutes(1), true).unwrap();
        assert_eq!(up, t);
    }

    #[test]
    fn alignment_is_idempotent() {
        let a = Duration::seconds(30);
        let t = ts("2026-08-25T12:34:56.789Z");
        let once = align_datetime(t, a, false).unwrap();
        let twice = align_datetime(once, a, false).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn aligned_result_stays_within_one_unit() {
        let a = Duration::minutes(1);
        let t = ts("2026-08-25T12:34:56.789Z");
        let aligned = align_datetime(t, a, false).unwrap();
        assert!(aligned <= t);
        assert!(t - aligned < a);
    }

    #[test]
    fn submicrosecond_residue_is_cleared() {
        let t = ts("2026-08-25T12:34:56Z") + Duration::nanoseconds(789);
        let aligned = align_datetime(t, Duration::seconds(1), false).unwrap();
        assert_eq!(aligned, ts("2026-08-25T12:34:56Z"));
    }

    #[test]
    fn zoned_day_alignment_snaps_to_local_midnight() {
        use chrono_tz::America::New_York;
        let t = ts("2026-08-25T03:30:00Z").with_timezone(&New_York); // 23:30 previous day local
        let aligned = align_datetime(t, Duration::days(1), false).unwrap();
        assert_eq!(aligned.to_utc(), ts("2026-08-24T04:00:00Z")); // local midnight, EDT
    }

    #[test]
    fn unit_is_one_of_the_coarsest_field() {
        assert_eq!(alignment_unit(Duration::minutes(15)), Duration::minutes(1));
        assert_eq!(alignment_unit(Duration::hours(2)), Duration::hours(1));
        assert_eq!(alignment_unit(Duration::days(3)), Duration::days(1));
        assert_eq!(alignment_unit(Duration::seconds(90)), Duration::minutes(1));
        assert_eq!(
            alignment_unit(Duration::milliseconds(500)),
            Duration::milliseconds(1)
        );
        assert_eq!(alignment_unit(Duration::zero()), Duration::zero());
    }
}
