// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calendar stepping helpers for periodic rules.
//!
//! Monthly occurrences are always re-derived from the rule's configured day,
//! so a day-31 rule clamped to Feb 28 still lands on Mar 31 the month after.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use cadence_core::Period;

/// Last day number of the given month.
pub(crate) fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    Some(first_of_next.pred_opt()?.day())
}

/// The date in `(year, month)` for a configured day-of-month, clamped to the
/// month's length.
pub(crate) fn clamped_date(year: i32, month: u32, day: u8) -> Option<NaiveDate> {
    let last = last_day_of_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, u32::from(day).min(last))
}

/// First occurrence of `period` at time `at` whose local datetime is at or
/// after `from`.
pub(crate) fn occurrence_on_or_after(
    from: NaiveDateTime,
    period: &Period,
    at: NaiveTime,
) -> Option<NaiveDateTime> {
    match period {
        Period::Daily => {
            let today = from.date().and_time(at);
            if today >= from {
                Some(today)
            } else {
                Some(from.date().checked_add_days(Days::new(1))?.and_time(at))
            }
        }
        Period::Weekly { weekday } => {
            let mut date = from.date();
            // At most 8 days covers "today but time already past".
            for _ in 0..8 {
                if date.weekday() == *weekday && date.and_time(at) >= from {
                    return Some(date.and_time(at));
                }
                date = date.checked_add_days(Days::new(1))?;
            }
            None
        }
        Period::Monthly { day } => {
            let this_month = clamped_date(from.year(), from.month(), *day)?.and_time(at);
            if this_month >= from {
                Some(this_month)
            } else {
                let (year, month) = next_month(from.year(), from.month());
                Some(clamped_date(year, month, *day)?.and_time(at))
            }
        }
    }
}

/// The occurrence one period after the occurrence on `date`.
pub(crate) fn step(date: NaiveDate, period: &Period) -> Option<NaiveDate> {
    match period {
        Period::Daily => date.checked_add_days(Days::new(1)),
        Period::Weekly { .. } => date.checked_add_days(Days::new(7)),
        Period::Monthly { day } => {
            let (year, month) = next_month(date.year(), date.month());
            clamped_date(year, month, *day)
        }
    }
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn february_has_28_or_29_days() {
        assert_eq!(last_day_of_month(2025, 2), Some(28));
        assert_eq!(last_day_of_month(2024, 2), Some(29));
        assert_eq!(last_day_of_month(2025, 12), Some(31));
    }

    #[test]
    fn day_31_clamps_to_month_length() {
        assert_eq!(clamped_date(2025, 2, 31), Some(date(2025, 2, 28)));
        assert_eq!(clamped_date(2025, 4, 31), Some(date(2025, 4, 30)));
        assert_eq!(clamped_date(2025, 1, 31), Some(date(2025, 1, 31)));
    }

    #[test]
    fn daily_occurrence_rolls_to_tomorrow_when_time_passed() {
        let from = date(2025, 6, 10).and_time(time(10, 0));
        let next = occurrence_on_or_after(from, &Period::Daily, time(9, 0)).unwrap();
        assert_eq!(next, date(2025, 6, 11).and_time(time(9, 0)));
    }

    #[test]
    fn weekly_occurrence_finds_requested_weekday() {
        // 2025-06-10 is a Tuesday.
        let from = date(2025, 6, 10).and_time(time(8, 0));
        let next = occurrence_on_or_after(
            from,
            &Period::Weekly {
                weekday: Weekday::Mon,
            },
            time(10, 0),
        )
        .unwrap();
        assert_eq!(next, date(2025, 6, 16).and_time(time(10, 0)));
    }

    #[test]
    fn weekly_occurrence_today_if_time_not_passed() {
        let from = date(2025, 6, 10).and_time(time(8, 0));
        let next = occurrence_on_or_after(
            from,
            &Period::Weekly {
                weekday: Weekday::Tue,
            },
            time(10, 0),
        )
        .unwrap();
        assert_eq!(next, date(2025, 6, 10).and_time(time(10, 0)));
    }

    #[test]
    fn monthly_step_recovers_from_february_clamp() {
        // A day-31 rule that last fired on the Feb clamp must land on Mar 31,
        // not Mar 28.
        let period = Period::Monthly { day: 31 };
        let stepped = step(date(2025, 2, 28), &period).unwrap();
        assert_eq!(stepped, date(2025, 3, 31));
    }

    #[test]
    fn monthly_step_crosses_year_boundary() {
        let period = Period::Monthly { day: 15 };
        let stepped = step(date(2025, 12, 15), &period).unwrap();
        assert_eq!(stepped, date(2026, 1, 15));
    }
}
