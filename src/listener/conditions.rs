//! Condition evaluation
//!
//! A listener fires only if every configured condition passes. Checks run
//! in a fixed order and stop at the first failure:
//!
//! 1. time-of-day window
//! 2. throttle
//! 3. exception days
//! 4. exception ranges
//!
//! All calendar comparisons use the local system timezone.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use std::fmt;

use super::event::{DateRange, EventListener, TimeWindow};

/// Why a listener was not fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    OutsideWindow,
    Throttled,
    ExceptionDay,
    ExceptionRange,
}

impl fmt::Display for Suppression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Suppression::OutsideWindow => "outside time window",
            Suppression::Throttled => "throttled",
            Suppression::ExceptionDay => "exception day",
            Suppression::ExceptionRange => "exception range",
        };
        f.write_str(reason)
    }
}

/// Evaluate every condition of `listener` at `now`
pub fn evaluate(listener: &EventListener, now: DateTime<Local>) -> Result<(), Suppression> {
    if !check_within_time_window(&listener.window, now.time()) {
        return Err(Suppression::OutsideWindow);
    }
    if !check_throttle(listener.throttle, listener.last_ran(), now.with_timezone(&Utc)) {
        return Err(Suppression::Throttled);
    }
    let today = now.date_naive();
    if check_exception_days(&listener.exception_days, today) {
        return Err(Suppression::ExceptionDay);
    }
    if check_exception_ranges(&listener.exception_ranges, today) {
        return Err(Suppression::ExceptionRange);
    }
    Ok(())
}

/// `true` when `time` is inside the window (or there is no window)
pub fn check_within_time_window(window: &TimeWindow, time: NaiveTime) -> bool {
    window.contains(time)
}

/// `true` when at least `throttle` has elapsed since `last_ran`
pub fn check_throttle(
    throttle: Option<Duration>,
    last_ran: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match (throttle, last_ran) {
        (Some(throttle), Some(last_ran)) => now.signed_duration_since(last_ran) >= throttle,
        _ => true,
    }
}

/// `true` when `today` is one of the exception days
pub fn check_exception_days(days: &[NaiveDate], today: NaiveDate) -> bool {
    days.contains(&today)
}

/// `true` when `today` falls in any exception range
pub fn check_exception_ranges(ranges: &[DateRange], today: NaiveDate) -> bool {
    ranges.iter().any(|range| range.contains(today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn listener() -> super::super::builder::CallbackStage {
        EventListener::builder()
            .event_types(["state_changed"])
            .call(|_, _, _| async {})
    }

    #[test]
    fn test_throttle_never_ran() {
        let now = Utc::now();
        assert!(check_throttle(Some(Duration::seconds(10)), None, now));
        assert!(check_throttle(None, Some(now), now));
    }

    #[test]
    fn test_throttle_elapsed() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let throttle = Some(Duration::seconds(10));

        assert!(!check_throttle(throttle, Some(start), start + Duration::seconds(5)));
        assert!(check_throttle(throttle, Some(start), start + Duration::seconds(10)));
        assert!(check_throttle(throttle, Some(start), start + Duration::seconds(11)));
    }

    #[test]
    fn test_exception_checks() {
        let days = [date(2024, 7, 4)];
        assert!(check_exception_days(&days, date(2024, 7, 4)));
        assert!(!check_exception_days(&days, date(2024, 7, 5)));

        let ranges = [DateRange {
            start: date(2024, 12, 24),
            end: date(2024, 12, 26),
        }];
        assert!(check_exception_ranges(&ranges, date(2024, 12, 25)));
        assert!(!check_exception_ranges(&ranges, date(2024, 12, 27)));
        assert!(!check_exception_ranges(&[], date(2024, 12, 25)));
    }

    #[test]
    fn test_evaluate_unconditional_listener() {
        let l = listener().build().unwrap();
        assert_eq!(evaluate(&l, at(2024, 3, 5, 12, 0, 0)), Ok(()));
    }

    #[test]
    fn test_evaluate_window_across_midnight() {
        let l = listener().only_between("22:00", "06:00").build().unwrap();
        assert_eq!(evaluate(&l, at(2024, 3, 5, 23, 30, 0)), Ok(()));
        assert_eq!(evaluate(&l, at(2024, 3, 6, 2, 0, 0)), Ok(()));
        assert_eq!(
            evaluate(&l, at(2024, 3, 6, 12, 0, 0)),
            Err(Suppression::OutsideWindow)
        );
    }

    #[test]
    fn test_evaluate_exception_day_wins_over_passing_conditions() {
        let l = listener()
            .only_after("08:00")
            .exception_day(date(2024, 7, 4))
            .build()
            .unwrap();
        assert_eq!(
            evaluate(&l, at(2024, 7, 4, 12, 0, 0)),
            Err(Suppression::ExceptionDay)
        );
        assert_eq!(evaluate(&l, at(2024, 7, 5, 12, 0, 0)), Ok(()));
    }

    #[test]
    fn test_evaluate_exception_range_boundaries() {
        let l = listener()
            .exception_range(date(2024, 12, 24), date(2024, 12, 26))
            .build()
            .unwrap();
        // Date boundary: last second of the day before, first second inside
        assert_eq!(evaluate(&l, at(2024, 12, 23, 23, 59, 59)), Ok(()));
        assert_eq!(
            evaluate(&l, at(2024, 12, 24, 0, 0, 0)),
            Err(Suppression::ExceptionRange)
        );
        assert_eq!(
            evaluate(&l, at(2024, 12, 26, 23, 59, 59)),
            Err(Suppression::ExceptionRange)
        );
        assert_eq!(evaluate(&l, at(2024, 12, 27, 0, 0, 0)), Ok(()));
    }

    #[test]
    fn test_evaluate_throttle_with_sub_millisecond_fire_time() {
        let l = listener().throttle("1s").build().unwrap();
        let t0 = at(2024, 6, 1, 12, 0, 0) + Duration::microseconds(900);
        l.mark_ran(t0.with_timezone(&Utc));

        // 999.7ms after the fire: still inside the throttle
        assert_eq!(
            evaluate(&l, t0 + Duration::microseconds(999_700)),
            Err(Suppression::Throttled)
        );
        assert_eq!(evaluate(&l, t0 + Duration::seconds(1)), Ok(()));
    }

    #[test]
    fn test_evaluate_order_window_before_throttle() {
        let l = listener()
            .only_before("06:00")
            .throttle("1h")
            .build()
            .unwrap();
        let noon = at(2024, 3, 5, 12, 0, 0);
        l.mark_ran(noon.with_timezone(&Utc));
        // Both window and throttle fail; the window is reported
        assert_eq!(evaluate(&l, noon), Err(Suppression::OutsideWindow));
    }
}
