// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Next-run computation for schedule recurrence rules.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};

use cadence_core::{CadenceError, Period, RecurrenceRule, ScheduleStatus};

use crate::calendar::{occurrence_on_or_after, step};

/// Widest real-world UTC offset, in minutes (UTC-12:00 .. UTC+14:00).
const MAX_OFFSET_MINUTES: i32 = 14 * 60;
const MIN_OFFSET_MINUTES: i32 = -12 * 60;

/// Compute the next occurrence of `rule` at or after `now`.
///
/// Returns `None` when the schedule has nothing left to fire: paused or
/// completed status, trigger-based rules, a one-time rule that already ran,
/// or a one-time instant already in the past (a missed occurrence is never
/// silently rescheduled).
///
/// Periodic rules advance from `last_run_at` (or from `now` when the
/// schedule has never fired) one period at a time on the rule's local
/// calendar, so the result never lands in the past and month-end clamping
/// is re-derived from the configured day every month.
pub fn compute_next_run(
    rule: &RecurrenceRule,
    status: ScheduleStatus,
    now: DateTime<Utc>,
    last_run_at: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    if status != ScheduleStatus::Active {
        return None;
    }

    match rule {
        RecurrenceRule::OneTime { at } => {
            if last_run_at.is_some() {
                return None;
            }
            if *at > now { Some(*at) } else { None }
        }
        RecurrenceRule::Periodic {
            period,
            at,
            utc_offset_minutes,
        } => next_periodic(period, *at, *utc_offset_minutes, now, last_run_at),
        RecurrenceRule::Triggered => None,
    }
}

fn next_periodic(
    period: &Period,
    at: NaiveTime,
    utc_offset_minutes: i32,
    now: DateTime<Utc>,
    last_run_at: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    let offset = FixedOffset::east_opt(utc_offset_minutes.checked_mul(60)?)?;

    let mut candidate = match last_run_at {
        Some(last) => {
            // Strictly after the last run: a schedule that just fired at its
            // occurrence instant must not fire twice for the same slot.
            let after = last.with_timezone(&offset).naive_local() + Duration::seconds(1);
            occurrence_on_or_after(after, period, at)?
        }
        None => occurrence_on_or_after(now.with_timezone(&offset).naive_local(), period, at)?,
    };

    loop {
        let utc = offset
            .from_local_datetime(&candidate)
            .single()?
            .with_timezone(&Utc);
        if utc >= now {
            return Some(utc);
        }
        candidate = step(candidate.date(), period)?.and_time(at);
    }
}

/// Validate a recurrence rule at schedule-creation time.
///
/// Resolution itself is total over valid rules; this is the synchronous
/// gate that keeps invalid rules out of the store.
pub fn validate_rule(rule: &RecurrenceRule) -> Result<(), CadenceError> {
    match rule {
        RecurrenceRule::OneTime { .. } | RecurrenceRule::Triggered => Ok(()),
        RecurrenceRule::Periodic {
            period,
            utc_offset_minutes,
            ..
        } => {
            if let Period::Monthly { day } = period
                && !(1..=31).contains(day)
            {
                return Err(CadenceError::Validation(format!(
                    "monthly day must be 1..=31, got {day}"
                )));
            }
            if !(MIN_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(utc_offset_minutes) {
                return Err(CadenceError::Validation(format!(
                    "utc_offset_minutes must be within {MIN_OFFSET_MINUTES}..={MAX_OFFSET_MINUTES}, got {utc_offset_minutes}"
                )));
            }
            Ok(())
        }
    }
}
