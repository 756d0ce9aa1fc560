// Occurrence calculation for recurring tournament definitions
//
// Every function here is pure: "now" is always passed in, never read from the
// wall clock, so results are deterministic for a given instant.

use crate::errors::ScheduleError;
use crate::models::Definition;
use crate::options::Cadence;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

/// Recurrence defines the interface for locating the next occurrence of a definition
pub trait Recurrence {
    /// Next occurrence at or after `now`
    fn next_occurrence(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError>;
}

impl Recurrence for Definition {
    fn next_occurrence(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        next_occurrence(self.first_date_utc, self.cadence, now)
    }
}

/// Calculate the next occurrence of `anchor` repeated with `cadence`, at or after `now`
///
/// The anchor itself is returned while it is still in the future. Otherwise the
/// search starts from today's UTC date at the anchor's time of day.
pub fn next_occurrence(
    anchor: DateTime<Utc>,
    cadence: Cadence,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    if anchor >= now {
        return Ok(anchor);
    }

    let candidate = now.date_naive().and_time(anchor.time()).and_utc();

    match cadence {
        Cadence::Daily => daily(anchor, candidate, now),
        Cadence::Weekly => weekly(anchor, candidate, now),
        Cadence::Fortnightly => fortnightly(anchor, candidate, now),
        Cadence::Monthly => monthly(anchor, now),
    }
}

/// The next `count` occurrences strictly in sequence, starting at or after `now`
pub fn upcoming(
    anchor: DateTime<Utc>,
    cadence: Cadence,
    now: DateTime<Utc>,
    count: usize,
) -> Result<Vec<DateTime<Utc>>, ScheduleError> {
    let mut occurrences = Vec::with_capacity(count);
    let mut from = now;
    for _ in 0..count {
        let next = next_occurrence(anchor, cadence, from)?;
        occurrences.push(next);
        from = next + Duration::seconds(1);
    }
    Ok(occurrences)
}

fn daily(
    anchor: DateTime<Utc>,
    candidate: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    if candidate < now {
        return add_days(anchor, candidate, 1);
    }
    Ok(candidate)
}

/// Align to the anchor's weekday; a candidate later today still counts, an
/// earlier one moves a week on.
fn weekly(
    anchor: DateTime<Utc>,
    candidate: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    let anchor_weekday = i64::from(anchor.weekday().num_days_from_monday());
    let candidate_weekday = i64::from(candidate.weekday().num_days_from_monday());
    let offset = (anchor_weekday - candidate_weekday).rem_euclid(7);

    let aligned = add_days(anchor, candidate, offset)?;
    if aligned < now {
        return add_days(anchor, aligned, 7);
    }
    Ok(aligned)
}

/// Weekly alignment, then skip the off week so results stay an even number of
/// weeks from the anchor.
fn fortnightly(
    anchor: DateTime<Utc>,
    candidate: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    let next = weekly(anchor, candidate, now)?;
    let weeks_elapsed = (next - anchor).num_weeks();
    if weeks_elapsed % 2 != 0 {
        return add_days(anchor, next, 7);
    }
    Ok(next)
}

/// Same day of month as the anchor, clamped to the last day of shorter months
///
/// The current month counts while its occurrence is still ahead, so a start
/// later this month is never skipped.
fn monthly(anchor: DateTime<Utc>, now: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
    let this_month = day_of_month(anchor, now.year(), now.month())?;
    if this_month >= now {
        return Ok(this_month);
    }

    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    day_of_month(anchor, year, month)
}

fn day_of_month(
    anchor: DateTime<Utc>,
    year: i32,
    month: u32,
) -> Result<DateTime<Utc>, ScheduleError> {
    let day = anchor.day().min(days_in_month(year, month).ok_or_else(|| out_of_range(anchor))?);
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| out_of_range(anchor))?;
    Ok(at_time(date, anchor.time()))
}

/// Number of days in the given month, `None` outside chrono's supported range
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    first_of_next.pred_opt().map(|last| last.day())
}

fn at_time(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    date.and_time(time).and_utc()
}

fn add_days(
    anchor: DateTime<Utc>,
    instant: DateTime<Utc>,
    days: i64,
) -> Result<DateTime<Utc>, ScheduleError> {
    instant
        .checked_add_signed(Duration::days(days))
        .ok_or_else(|| out_of_range(anchor))
}

fn out_of_range(anchor: DateTime<Utc>) -> ScheduleError {
    ScheduleError::OutOfRange {
        anchor: anchor.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike, Weekday};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_future_anchor_is_returned_unchanged() {
        let anchor = utc(2024, 6, 1, 12, 0, 0);
        let now = utc(2024, 5, 1, 12, 0, 0);
        for cadence in Cadence::ALL {
            assert_eq!(next_occurrence(anchor, *cadence, now).unwrap(), anchor);
        }
    }

    #[test]
    fn test_anchor_equal_to_now_is_returned() {
        let anchor = utc(2024, 6, 1, 12, 0, 0);
        assert_eq!(
            next_occurrence(anchor, Cadence::Weekly, anchor).unwrap(),
            anchor
        );
    }

    #[test]
    fn test_daily_later_today() {
        let anchor = utc(2024, 1, 1, 18, 0, 0);
        let now = utc(2024, 3, 15, 10, 0, 0);
        assert_eq!(
            next_occurrence(anchor, Cadence::Daily, now).unwrap(),
            utc(2024, 3, 15, 18, 0, 0)
        );
    }

    #[test]
    fn test_daily_already_passed_today() {
        let anchor = utc(2024, 1, 1, 8, 30, 15);
        let now = utc(2024, 3, 15, 10, 0, 0);
        assert_eq!(
            next_occurrence(anchor, Cadence::Daily, now).unwrap(),
            utc(2024, 3, 16, 8, 30, 15)
        );
    }

    #[test]
    fn test_weekly_lands_on_anchor_weekday() {
        // Anchor is a Monday, now is a Friday
        let anchor = utc(2024, 1, 1, 18, 0, 0);
        let now = utc(2024, 3, 15, 10, 0, 0);
        let next = next_occurrence(anchor, Cadence::Weekly, now).unwrap();
        assert_eq!(next, utc(2024, 3, 18, 18, 0, 0));
        assert_eq!(next.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_weekly_same_weekday_before_anchor_time_is_today() {
        let anchor = utc(2024, 1, 1, 18, 0, 0);
        let now = utc(2024, 3, 18, 17, 59, 59);
        assert_eq!(
            next_occurrence(anchor, Cadence::Weekly, now).unwrap(),
            utc(2024, 3, 18, 18, 0, 0)
        );
    }

    #[test]
    fn test_weekly_same_weekday_after_anchor_time_is_next_week() {
        let anchor = utc(2024, 1, 1, 18, 0, 0);
        let now = utc(2024, 3, 18, 18, 0, 1);
        assert_eq!(
            next_occurrence(anchor, Cadence::Weekly, now).unwrap(),
            utc(2024, 3, 25, 18, 0, 0)
        );
    }

    #[test]
    fn test_fortnightly_skips_off_week() {
        // 2024-03-18 is 11 weeks after the anchor, so the next on-week is 03-25
        let anchor = utc(2024, 1, 1, 18, 0, 0);
        let now = utc(2024, 3, 15, 10, 0, 0);
        let next = next_occurrence(anchor, Cadence::Fortnightly, now).unwrap();
        assert_eq!(next, utc(2024, 3, 25, 18, 0, 0));
        assert_eq!((next - anchor).num_weeks() % 2, 0);
    }

    #[test]
    fn test_fortnightly_on_week() {
        let anchor = utc(2024, 1, 1, 18, 0, 0);
        let now = utc(2024, 3, 9, 10, 0, 0);
        assert_eq!(
            next_occurrence(anchor, Cadence::Fortnightly, now).unwrap(),
            utc(2024, 3, 11, 18, 0, 0)
        );
    }

    #[test]
    fn test_monthly_later_this_month() {
        let anchor = utc(2024, 1, 20, 9, 0, 0);
        let now = utc(2024, 3, 5, 10, 0, 0);
        assert_eq!(
            next_occurrence(anchor, Cadence::Monthly, now).unwrap(),
            utc(2024, 3, 20, 9, 0, 0)
        );
    }

    #[test]
    fn test_monthly_upcoming_keeps_current_month() {
        let anchor = utc(2024, 1, 20, 9, 0, 0);
        let now = utc(2024, 3, 5, 10, 0, 0);
        assert_eq!(
            upcoming(anchor, Cadence::Monthly, now, 2).unwrap(),
            vec![utc(2024, 3, 20, 9, 0, 0), utc(2024, 4, 20, 9, 0, 0)]
        );
    }

    #[test]
    fn test_monthly_passed_this_month() {
        let anchor = utc(2024, 1, 20, 9, 0, 0);
        let now = utc(2024, 3, 20, 10, 0, 0);
        assert_eq!(
            next_occurrence(anchor, Cadence::Monthly, now).unwrap(),
            utc(2024, 4, 20, 9, 0, 0)
        );
    }

    #[test]
    fn test_monthly_rolls_over_year_end() {
        let anchor = utc(2024, 1, 10, 9, 0, 0);
        let now = utc(2024, 12, 11, 0, 0, 0);
        assert_eq!(
            next_occurrence(anchor, Cadence::Monthly, now).unwrap(),
            utc(2025, 1, 10, 9, 0, 0)
        );
    }

    #[test]
    fn test_monthly_clamps_to_short_month() {
        let anchor = utc(2024, 1, 31, 20, 0, 0);
        let now = utc(2024, 4, 2, 0, 0, 0);
        assert_eq!(
            next_occurrence(anchor, Cadence::Monthly, now).unwrap(),
            utc(2024, 4, 30, 20, 0, 0)
        );
        let now = utc(2024, 2, 1, 0, 0, 0);
        assert_eq!(
            next_occurrence(anchor, Cadence::Monthly, now).unwrap(),
            utc(2024, 2, 29, 20, 0, 0)
        );
    }

    #[test]
    fn test_monthly_returns_to_anchor_day_after_short_month() {
        let anchor = utc(2024, 1, 31, 20, 0, 0);
        let now = utc(2024, 4, 30, 21, 0, 0);
        assert_eq!(
            next_occurrence(anchor, Cadence::Monthly, now).unwrap(),
            utc(2024, 5, 31, 20, 0, 0)
        );
    }

    #[test]
    fn test_time_of_day_preserved() {
        let anchor = utc(2023, 7, 4, 23, 45, 30);
        let now = utc(2024, 2, 29, 23, 50, 0);
        for cadence in Cadence::ALL {
            let next = next_occurrence(anchor, *cadence, now).unwrap();
            assert!(next >= now);
            assert_eq!(
                (next.hour(), next.minute(), next.second()),
                (23, 45, 30)
            );
        }
    }

    #[test]
    fn test_upcoming_weekly_sequence() {
        let anchor = utc(2024, 1, 1, 18, 0, 0);
        let now = utc(2024, 3, 15, 10, 0, 0);
        let dates = upcoming(anchor, Cadence::Weekly, now, 3).unwrap();
        assert_eq!(
            dates,
            vec![
                utc(2024, 3, 18, 18, 0, 0),
                utc(2024, 3, 25, 18, 0, 0),
                utc(2024, 4, 1, 18, 0, 0),
            ]
        );
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2024, 12), Some(31));
        assert_eq!(days_in_month(2024, 4), Some(30));
    }
}
