//! Calendar boundary arithmetic
//!
//! All boundaries are computed on the naive wall clock of the zone the range
//! was given in, then mapped back with [`localize`] (period starts) or
//! [`localize_end`] (period ends). Days end at `23:59:59.999999999`, weeks end
//! on Sunday and months end on their last day.
use chrono::{
    DateTime, Datelike, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta,
    TimeZone,
};

/// Midnight at the start of `date`
#[must_use]
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last nanosecond of `date`
#[must_use]
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + (TimeDelta::days(1) - TimeDelta::nanoseconds(1))
}

/// Midnight at the start of the day after `date`
#[must_use]
pub fn start_of_next_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + TimeDelta::days(1)
}

/// Days from `date` to the Sunday closing its week (0 on a Sunday)
fn days_until_sunday(date: NaiveDate) -> i64 {
    // Monday = 1 .. Sunday = 7
    7 - i64::from(date.weekday().number_from_monday())
}

/// Last nanosecond of the Sunday that closes the week containing `date`
#[must_use]
pub fn end_of_week(date: NaiveDate) -> NaiveDateTime {
    end_of_day(date + TimeDelta::days(days_until_sunday(date)))
}

/// Midnight on the Monday after the week containing `date`
#[must_use]
pub fn start_of_next_week(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date + TimeDelta::days(days_until_sunday(date) + 1))
}

/// Midnight on the first day of the month after `date`
#[must_use]
pub fn start_of_next_month(date: NaiveDate) -> NaiveDateTime {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX);
    start_of_day(first)
}

/// Last nanosecond of the month containing `date`
#[must_use]
pub fn end_of_month(date: NaiveDate) -> NaiveDateTime {
    start_of_next_month(date) - TimeDelta::nanoseconds(1)
}

/// Map a wall-clock time back into `tz`
///
/// Ambiguous times (clocks set back) resolve to the earlier instant. Times
/// skipped by a forward transition are read with the offset in force before
/// the gap, which lands just after it.
pub fn localize<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let offset_before = tz
                .offset_from_local_datetime(&(naive - TimeDelta::days(1)))
                .earliest()
                .map_or(0, |offset| offset.fix().local_minus_utc());
            let utc = naive - TimeDelta::seconds(i64::from(offset_before));
            tz.from_utc_datetime(&utc)
        }
    }
}

/// Map the last wall-clock nanosecond of a period back into `tz`
///
/// The instant is taken one nanosecond before the localized start of the next
/// period, so a period ending inside a repeated or skipped hour still meets
/// its successor exactly.
pub fn localize_end<Tz: TimeZone>(tz: &Tz, naive_end: NaiveDateTime) -> DateTime<Tz> {
    let one = TimeDelta::nanoseconds(1);
    let Some(next_start) = naive_end.checked_add_signed(one) else {
        return localize(tz, naive_end);
    };
    let next = localize(tz, next_start);
    next.clone().checked_sub_signed(one).unwrap_or(next)
}
