//! Habit progress tracking: day rollover, daily targets and streaks.
//!
//! All functions take the calendar day explicitly so that the rules are
//! independent of the wall clock.
//!
//! ## Rules
//!
//! 1. **Reconcile** before any read or write of progress: a habit last
//!    touched on another day has its progress zeroed, and a streak whose
//!    latest completion is older than yesterday drops to 0.
//! 2. **Progress** clamps checkbox counts to `[0, target]`; time totals only
//!    floor at 0.
//! 3. **Completion** of a day appends it to the history once and extends the
//!    streak if yesterday is present, otherwise starts a new streak at 1.
//!    Dropping back below target does not undo either.

use crate::types::{Habit, HabitKind, HabitTracking};
use crate::{new_id, Error, Result};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::HashSet;

/// Reset day-scoped fields if `today` differs from the last tracked day
///
/// Idempotent for a given `today`.
pub fn reconcile(habit: &Habit, today: NaiveDate) -> Habit {
    let mut habit = habit.clone();

    if habit.last_tracked_date != Some(today) {
        match &mut habit.tracking {
            HabitTracking::Checkbox { current_count, .. } => *current_count = 0,
            HabitTracking::Time {
                total_time_logged, ..
            } => *total_time_logged = 0,
        }
        habit.completed_today = false;
        habit.last_tracked_date = Some(today);
    }

    let yesterday = today - Duration::days(1);
    match habit.completion_history.iter().max() {
        Some(&last) if last == today || last == yesterday => {}
        _ => {
            if habit.streak != 0 {
                tracing::debug!("Streak for habit {} broken, resetting", habit.id);
            }
            habit.streak = 0;
        }
    }

    habit
}

/// Apply a progress change (count or minutes) for `today`
pub fn apply_progress(habit: &Habit, delta: i64, today: NaiveDate) -> Habit {
    let mut habit = reconcile(habit, today);
    let was_completed = habit.completed_today;

    match &mut habit.tracking {
        HabitTracking::Checkbox {
            current_count,
            target_count,
        } => {
            let next = (*current_count as i64 + delta).clamp(0, *target_count as i64);
            *current_count = next as u32;
        }
        HabitTracking::Time {
            total_time_logged, ..
        } => {
            let next = (*total_time_logged as i64 + delta).clamp(0, u32::MAX as i64);
            *total_time_logged = next as u32;
        }
    }
    habit.completed_today = habit.tracking.is_met();

    if habit.completed_today && !was_completed && !habit.completion_history.contains(&today) {
        let yesterday = today - Duration::days(1);
        habit.streak = if habit.completion_history.contains(&yesterday) {
            habit.streak + 1
        } else {
            1
        };
        habit.completion_history.push(today);
        tracing::info!(
            "Habit '{}' completed for {} (streak {})",
            habit.name,
            today,
            habit.streak
        );
    }

    habit
}

/// A new habit with zero progress and empty history
pub fn create(name: &str, tracking: HabitTracking, today: NaiveDate) -> Result<Habit> {
    let name = validate_name(name)?;
    let tracking = with_zero_progress(tracking)?;

    Ok(Habit {
        id: new_id(),
        name,
        tracking,
        last_tracked_date: Some(today),
        completed_today: false,
        streak: 0,
        completion_history: Vec::new(),
    })
}

/// Change a habit's name and tracking target
///
/// Streak and history always survive. Today's progress survives unless the
/// tracking type changes, in which case it restarts at zero. The progress
/// values carried by `tracking` are ignored; only its kind and target count.
pub fn edit(habit: &Habit, name: &str, tracking: HabitTracking, today: NaiveDate) -> Result<Habit> {
    let name = validate_name(name)?;
    let fresh = with_zero_progress(tracking)?;
    let mut habit = reconcile(habit, today);

    habit.name = name;
    habit.tracking = match (&habit.tracking, fresh) {
        (
            HabitTracking::Checkbox { current_count, .. },
            HabitTracking::Checkbox { target_count, .. },
        ) => HabitTracking::Checkbox {
            current_count: (*current_count).min(target_count),
            target_count,
        },
        (
            HabitTracking::Time {
                total_time_logged, ..
            },
            HabitTracking::Time { target_time, .. },
        ) => HabitTracking::Time {
            total_time_logged: *total_time_logged,
            target_time,
        },
        (_, other) => {
            tracing::debug!("Habit {} changed tracking type, progress reset", habit.id);
            other
        }
    };
    habit.completed_today = habit.tracking.is_met();

    Ok(habit)
}

/// Parse minutes typed by the user; must be a positive whole number
pub fn parse_minutes(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    let minutes: i64 = trimmed
        .parse()
        .map_err(|_| Error::Validation(format!("'{}' is not a number of minutes", trimmed)))?;
    if minutes <= 0 {
        return Err(Error::Validation("Minutes must be greater than zero".into()));
    }
    u32::try_from(minutes).map_err(|_| Error::Validation("Too many minutes".into()))
}

/// Tracking variant for `kind` with the given target and zero progress
pub fn tracking_for(kind: HabitKind, target: u32) -> HabitTracking {
    match kind {
        HabitKind::Checkbox => HabitTracking::Checkbox {
            current_count: 0,
            target_count: target,
        },
        HabitKind::Time => HabitTracking::Time {
            total_time_logged: 0,
            target_time: target,
        },
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("Habit name is required".into()));
    }
    Ok(trimmed.to_string())
}

fn with_zero_progress(tracking: HabitTracking) -> Result<HabitTracking> {
    let target = tracking.target();
    if target == 0 {
        return Err(Error::Validation("Daily target must be at least 1".into()));
    }
    Ok(tracking_for(tracking.kind(), target))
}

// ============================================================================
// History views
// ============================================================================

/// Longest run of consecutive days in the completion history
pub fn longest_streak(habit: &Habit) -> u32 {
    let mut days: Vec<NaiveDate> = habit.completion_history.clone();
    days.sort();
    days.dedup();

    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in days {
        current = match previous {
            Some(p) if day - p == Duration::days(1) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(day);
    }
    longest
}

/// How a calendar day looks in the history view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayStatus {
    Completed,
    Missed,
    Future,
}

/// One month of the history calendar
#[derive(Clone, Debug)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Blank cells before the 1st, with weeks starting on Sunday
    pub leading_blanks: u32,
    pub days: Vec<(NaiveDate, DayStatus)>,
}

/// The current month and the `months - 1` before it, oldest first
pub fn completion_calendar(habit: &Habit, today: NaiveDate, months: u32) -> Vec<CalendarMonth> {
    let completed: HashSet<NaiveDate> = habit.completion_history.iter().copied().collect();
    let mut calendar = Vec::with_capacity(months as usize);

    for back in (0..months).rev() {
        let (year, month) = months_before(today.year(), today.month(), back);
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            continue;
        };

        let days = first
            .iter_days()
            .take_while(|d| d.month() == month)
            .map(|d| {
                let status = if d > today {
                    DayStatus::Future
                } else if completed.contains(&d) {
                    DayStatus::Completed
                } else {
                    DayStatus::Missed
                };
                (d, status)
            })
            .collect();

        calendar.push(CalendarMonth {
            year,
            month,
            leading_blanks: first.weekday().num_days_from_sunday(),
            days,
        });
    }

    calendar
}

fn months_before(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}
