//! Core domain types for LifeSync.
//!
//! This module defines the records shared by the workout and habit halves of
//! the system:
//! - Exercises and workout templates
//! - Workout sessions and the sets logged during them
//! - Habits and their tracking variants
//!
//! Field names serialize in camelCase so that persisted records keep the same
//! shape as the ones written by the browser client.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Exercise and Template Types
// ============================================================================

/// A catalog exercise (e.g., "Push-ups")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub body_part: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One planned set of an exercise inside a template
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlannedSet {
    pub id: String,
    pub set_number: u32,
    pub reps: u32,
}

/// An exercise as it appears in a workout template
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateExercise {
    #[serde(flatten)]
    pub exercise: Exercise,
    pub planned_sets: Vec<PlannedSet>,
}

/// A user-authored, reusable workout definition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTemplate {
    pub id: String,
    pub name: String,
    pub exercises: Vec<TemplateExercise>,
}

// ============================================================================
// Session Types
// ============================================================================

/// Lifecycle status of a workout session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Cancelled,
}

/// An actual set performed during a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoggedSet {
    pub id: String,
    pub set_number: u32,
    /// `None` until the set has been recorded
    pub actual_reps: Option<u32>,
}

impl LoggedSet {
    pub fn is_completed(&self) -> bool {
        self.actual_reps.is_some()
    }
}

/// Denormalized copy of a template exercise plus the sets logged against it
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoggedExercise {
    pub exercise_id: String,
    pub exercise_name: String,
    pub body_part: String,
    pub planned_sets: Vec<PlannedSet>,
    pub logged_sets: Vec<LoggedSet>,
}

impl LoggedExercise {
    /// Number of sets with recorded reps
    pub fn completed_sets(&self) -> usize {
        self.logged_sets.iter().filter(|s| s.is_completed()).count()
    }

    /// Recorded reps in set order, skipping sets never performed
    pub fn recorded_reps(&self) -> Vec<u32> {
        self.logged_sets
            .iter()
            .filter_map(|s| s.actual_reps)
            .collect()
    }
}

/// One concrete attempt at a workout template
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: String,
    pub template_id: String,
    pub template_name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    pub status: SessionStatus,
    pub logged_exercises: Vec<LoggedExercise>,
}

// ============================================================================
// Habit Types
// ============================================================================

/// How progress toward a habit's daily target is measured
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(
    tag = "trackingType",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum HabitTracking {
    /// Counted completions (e.g., 8 glasses of water)
    Checkbox { current_count: u32, target_count: u32 },
    /// Minutes logged (e.g., 15 minutes of reading)
    Time { total_time_logged: u32, target_time: u32 },
}

/// Discriminant of [`HabitTracking`] without the progress payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HabitKind {
    Checkbox,
    Time,
}

impl HabitTracking {
    pub fn kind(&self) -> HabitKind {
        match self {
            HabitTracking::Checkbox { .. } => HabitKind::Checkbox,
            HabitTracking::Time { .. } => HabitKind::Time,
        }
    }

    /// Today's progress (count or minutes)
    pub fn progress(&self) -> u32 {
        match self {
            HabitTracking::Checkbox { current_count, .. } => *current_count,
            HabitTracking::Time {
                total_time_logged, ..
            } => *total_time_logged,
        }
    }

    /// Daily target (count or minutes)
    pub fn target(&self) -> u32 {
        match self {
            HabitTracking::Checkbox { target_count, .. } => *target_count,
            HabitTracking::Time { target_time, .. } => *target_time,
        }
    }

    pub fn is_met(&self) -> bool {
        self.progress() >= self.target()
    }
}

/// A daily habit with streak and completion history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub tracking: HabitTracking,
    #[serde(default)]
    pub last_tracked_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed_today: bool,
    #[serde(default)]
    pub streak: u32,
    /// Days on which the daily target was met; unique, append-only
    #[serde(default)]
    pub completion_history: Vec<NaiveDate>,
}

// ============================================================================
// Record identity
// ============================================================================

/// Records stored in a persisted collection are addressed by a string id
pub trait Record {
    fn id(&self) -> &str;
}

impl Record for WorkoutTemplate {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for WorkoutSession {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Habit {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Generate a fresh record id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
