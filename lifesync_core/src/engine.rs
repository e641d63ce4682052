//! Guided workout session engine.
//!
//! A session walks a template in rounds: round N visits set N of every
//! exercise in template order, then round N+1 begins. An exercise whose
//! planned sets run out before the last round is skipped in the rounds it has
//! no set for, so the cursor always points at a real planned set.
//!
//! Time is driven from outside: [`WorkoutSessionEngine::tick`] is called once
//! per second and advances both the elapsed timer and, while resting, the
//! rest countdown. Every transition is a synchronous method call.

use crate::types::{LoggedExercise, LoggedSet, SessionStatus, WorkoutSession, WorkoutTemplate};
use crate::{new_id, Error, Result};
use chrono::{DateTime, Utc};

/// Rest between sets when no configuration overrides it
pub const DEFAULT_REST_SECONDS: u32 = 60;

/// Position of the next set to perform
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub exercise_index: usize,
    /// Also the round number; starts at 1
    pub set_number: u32,
}

/// Explicit session state
///
/// `Resting` always carries a pending advance which runs exactly once, when
/// the countdown expires or the rest is skipped. Pausing during a rest keeps
/// the countdown alive in `Paused { rest_remaining }`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Resting { remaining_seconds: u32 },
    Paused { rest_remaining: Option<u32> },
    Completed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }
}

/// Result of running the pending advance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    Moved(Cursor),
    Completed,
}

/// What `record_set` did after storing the reps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Rest countdown started; the cursor moves when it ends
    Resting { seconds: u32 },
    /// Rest is disabled, the cursor already moved
    Advanced(Cursor),
    /// That was the final set
    Completed,
}

/// What a one-second tick did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused without a rest, or the session is over
    Idle,
    Ticked,
    RestFinished(Advance),
}

/// Read-only view of the set under the cursor
#[derive(Clone, Debug)]
pub struct CurrentSet<'a> {
    pub exercise: &'a LoggedExercise,
    pub exercise_index: usize,
    pub exercise_count: usize,
    pub set_number: u32,
    pub set_count: usize,
    pub planned_reps: Option<u32>,
    pub actual_reps: Option<u32>,
}

pub struct WorkoutSessionEngine {
    session: WorkoutSession,
    cursor: Cursor,
    state: SessionState,
    elapsed_seconds: u32,
    rest_seconds: u32,
    max_rounds: u32,
}

impl WorkoutSessionEngine {
    /// Start a session from a template
    ///
    /// Every exercise must have at least one planned set.
    pub fn start(
        template: &WorkoutTemplate,
        now: DateTime<Utc>,
        rest_seconds: u32,
    ) -> Result<Self> {
        if template.exercises.is_empty() {
            return Err(Error::Validation(format!(
                "Workout '{}' has no exercises",
                template.name
            )));
        }
        if let Some(empty) = template
            .exercises
            .iter()
            .find(|e| e.planned_sets.is_empty())
        {
            return Err(Error::Validation(format!(
                "Exercise '{}' has no planned sets",
                empty.exercise.name
            )));
        }
        if let Some(gapped) = template.exercises.iter().find(|e| !e.has_contiguous_sets()) {
            return Err(Error::Validation(format!(
                "Planned sets for '{}' must be numbered 1, 2, 3, ...",
                gapped.exercise.name
            )));
        }

        let logged_exercises: Vec<LoggedExercise> = template
            .exercises
            .iter()
            .map(|te| LoggedExercise {
                exercise_id: te.exercise.id.clone(),
                exercise_name: te.exercise.name.clone(),
                body_part: te.exercise.body_part.clone(),
                planned_sets: te.planned_sets.clone(),
                logged_sets: te
                    .planned_sets
                    .iter()
                    .map(|ps| LoggedSet {
                        id: format!("{}-log-{}", te.exercise.id, ps.set_number),
                        set_number: ps.set_number,
                        actual_reps: None,
                    })
                    .collect(),
            })
            .collect();

        let max_rounds = logged_exercises
            .iter()
            .map(|e| e.planned_sets.len() as u32)
            .max()
            .unwrap_or(1);

        let session = WorkoutSession {
            id: new_id(),
            template_id: template.id.clone(),
            template_name: template.name.clone(),
            start_time: now,
            end_time: None,
            duration_seconds: None,
            status: SessionStatus::InProgress,
            logged_exercises,
        };

        tracing::info!(
            "Started session {} from template '{}' ({} exercises, {} rounds)",
            session.id,
            template.name,
            session.logged_exercises.len(),
            max_rounds
        );

        Ok(Self {
            session,
            cursor: Cursor {
                exercise_index: 0,
                set_number: 1,
            },
            state: SessionState::Running,
            elapsed_seconds: 0,
            rest_seconds,
            max_rounds,
        })
    }

    pub fn session(&self) -> &WorkoutSession {
        &self.session
    }

    pub fn into_session(self) -> WorkoutSession {
        self.session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Cursor of the next set, `None` once the session has ended
    pub fn cursor(&self) -> Option<Cursor> {
        if self.state.is_terminal() {
            None
        } else {
            Some(self.cursor)
        }
    }

    pub fn current_set(&self) -> Option<CurrentSet<'_>> {
        let cursor = self.cursor()?;
        let exercise = self.session.logged_exercises.get(cursor.exercise_index)?;
        let planned_reps = exercise
            .planned_sets
            .iter()
            .find(|ps| ps.set_number == cursor.set_number)
            .map(|ps| ps.reps);
        let actual_reps = exercise
            .logged_sets
            .iter()
            .find(|ls| ls.set_number == cursor.set_number)
            .and_then(|ls| ls.actual_reps);

        Some(CurrentSet {
            exercise,
            exercise_index: cursor.exercise_index,
            exercise_count: self.session.logged_exercises.len(),
            set_number: cursor.set_number,
            set_count: exercise.planned_sets.len(),
            planned_reps,
            actual_reps,
        })
    }

    /// Reps to pre-fill for the current set: what was recorded, else the plan
    pub fn suggested_reps(&self) -> Option<u32> {
        self.current_set()
            .and_then(|current| current.actual_reps.or(current.planned_reps))
    }

    /// Parse free-text reps input and record it
    pub fn record_set_input(&mut self, input: &str, now: DateTime<Utc>) -> Result<RecordOutcome> {
        let reps = parse_reps(input)?;
        self.record_set(reps, now)
    }

    /// Record actual reps for the set under the cursor
    ///
    /// Only allowed while running. A set that already has reps is rejected
    /// and nothing changes. Recording the final set completes the session
    /// without a rest.
    pub fn record_set(&mut self, actual_reps: u32, now: DateTime<Utc>) -> Result<RecordOutcome> {
        match self.state {
            SessionState::Running => {}
            SessionState::Resting { .. } => {
                return Err(Error::Session("Cannot record a set while resting".into()))
            }
            SessionState::Paused { .. } => {
                return Err(Error::Session("Session is paused".into()))
            }
            SessionState::Completed | SessionState::Cancelled => {
                return Err(Error::Session("Session has ended".into()))
            }
        }

        let cursor = self.cursor;
        let slot = self
            .session
            .logged_exercises
            .get_mut(cursor.exercise_index)
            .and_then(|e| {
                e.logged_sets
                    .iter_mut()
                    .find(|s| s.set_number == cursor.set_number)
            })
            .ok_or_else(|| Error::Session(format!("No set at {:?}", cursor)))?;

        if slot.is_completed() {
            return Err(Error::Session(format!(
                "Set {} of exercise {} is already recorded",
                cursor.set_number,
                cursor.exercise_index + 1
            )));
        }
        slot.actual_reps = Some(actual_reps);

        tracing::debug!(
            "Recorded {} reps for exercise {} set {}",
            actual_reps,
            cursor.exercise_index,
            cursor.set_number
        );

        if self.next_position().is_none() {
            self.complete(now);
            return Ok(RecordOutcome::Completed);
        }

        if self.rest_seconds == 0 {
            return Ok(match self.advance(now) {
                Advance::Moved(next) => RecordOutcome::Advanced(next),
                Advance::Completed => RecordOutcome::Completed,
            });
        }

        self.state = SessionState::Resting {
            remaining_seconds: self.rest_seconds,
        };
        Ok(RecordOutcome::Resting {
            seconds: self.rest_seconds,
        })
    }

    /// One second of wall time
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        match self.state {
            SessionState::Running => {
                self.elapsed_seconds += 1;
                TickOutcome::Ticked
            }
            SessionState::Resting { remaining_seconds } => {
                self.elapsed_seconds += 1;
                let remaining = remaining_seconds.saturating_sub(1);
                if remaining == 0 {
                    self.state = SessionState::Running;
                    TickOutcome::RestFinished(self.advance(now))
                } else {
                    self.state = SessionState::Resting {
                        remaining_seconds: remaining,
                    };
                    TickOutcome::Ticked
                }
            }
            // The rest countdown keeps running while paused
            SessionState::Paused {
                rest_remaining: Some(rest),
            } => {
                let remaining = rest.saturating_sub(1);
                if remaining == 0 {
                    self.state = SessionState::Paused {
                        rest_remaining: None,
                    };
                    TickOutcome::RestFinished(self.advance(now))
                } else {
                    self.state = SessionState::Paused {
                        rest_remaining: Some(remaining),
                    };
                    TickOutcome::Ticked
                }
            }
            SessionState::Paused {
                rest_remaining: None,
            }
            | SessionState::Completed
            | SessionState::Cancelled => TickOutcome::Idle,
        }
    }

    /// End the rest now and run the pending advance
    pub fn skip_rest(&mut self, now: DateTime<Utc>) -> Result<Advance> {
        match self.state {
            SessionState::Resting { .. } => {
                self.state = SessionState::Running;
            }
            SessionState::Paused {
                rest_remaining: Some(_),
            } => {
                self.state = SessionState::Paused {
                    rest_remaining: None,
                };
            }
            _ => return Err(Error::Session("Not resting".into())),
        }
        Ok(self.advance(now))
    }

    pub fn pause(&mut self) -> Result<()> {
        self.state = match self.state {
            SessionState::Running => SessionState::Paused {
                rest_remaining: None,
            },
            SessionState::Resting { remaining_seconds } => SessionState::Paused {
                rest_remaining: Some(remaining_seconds),
            },
            SessionState::Paused { .. } => return Err(Error::Session("Already paused".into())),
            SessionState::Completed | SessionState::Cancelled => {
                return Err(Error::Session("Session has ended".into()))
            }
        };
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        self.state = match self.state {
            SessionState::Paused {
                rest_remaining: None,
            } => SessionState::Running,
            SessionState::Paused {
                rest_remaining: Some(remaining_seconds),
            } => SessionState::Resting { remaining_seconds },
            SessionState::Completed | SessionState::Cancelled => {
                return Err(Error::Session("Session has ended".into()))
            }
            _ => return Err(Error::Session("Not paused".into())),
        };
        Ok(())
    }

    pub fn toggle_pause(&mut self) -> Result<()> {
        match self.state {
            SessionState::Paused { .. } => self.resume(),
            _ => self.pause(),
        }
    }

    /// Complete the session early, keeping whatever has been logged
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<&WorkoutSession> {
        match self.state {
            SessionState::Completed => {
                return Err(Error::Session("Session already completed".into()))
            }
            SessionState::Cancelled => {
                return Err(Error::Session("Session was cancelled".into()))
            }
            _ => {}
        }
        self.complete(now);
        Ok(&self.session)
    }

    /// Discard the session; cancelled sessions are never persisted
    pub fn cancel(&mut self) -> Result<()> {
        match self.state {
            SessionState::Completed => {
                Err(Error::Session("Session already completed".into()))
            }
            SessionState::Cancelled => Ok(()),
            _ => {
                self.state = SessionState::Cancelled;
                self.session.status = SessionStatus::Cancelled;
                tracing::info!("Cancelled session {}", self.session.id);
                Ok(())
            }
        }
    }

    fn has_set(&self, cursor: Cursor) -> bool {
        self.session
            .logged_exercises
            .get(cursor.exercise_index)
            .map(|e| e.planned_sets.len() as u32 >= cursor.set_number)
            .unwrap_or(false)
    }

    /// Next cursor in round order, `None` when the last round is exhausted
    fn next_position(&self) -> Option<Cursor> {
        let count = self.session.logged_exercises.len();
        let mut next = self.cursor;
        loop {
            next.exercise_index += 1;
            if next.exercise_index >= count {
                next.exercise_index = 0;
                next.set_number += 1;
            }
            if next.set_number > self.max_rounds {
                return None;
            }
            if self.has_set(next) {
                return Some(next);
            }
        }
    }

    fn advance(&mut self, now: DateTime<Utc>) -> Advance {
        match self.next_position() {
            Some(next) => {
                self.cursor = next;
                Advance::Moved(next)
            }
            None => {
                self.complete(now);
                Advance::Completed
            }
        }
    }

    fn complete(&mut self, now: DateTime<Utc>) {
        self.state = SessionState::Completed;
        self.session.status = SessionStatus::Completed;
        self.session.end_time = Some(now.max(self.session.start_time));
        self.session.duration_seconds = Some(self.elapsed_seconds);
        tracing::info!(
            "Completed session {} in {}",
            self.session.id,
            format_duration(self.elapsed_seconds)
        );
    }
}

/// Parse reps typed by the user into a non-negative whole number
pub fn parse_reps(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("Enter reps".into()));
    }
    let value: i64 = trimmed
        .parse()
        .map_err(|_| Error::Validation(format!("'{}' is not a whole number", trimmed)))?;
    if value < 0 {
        return Err(Error::Validation("Reps cannot be negative".into()));
    }
    u32::try_from(value).map_err(|_| Error::Validation(format!("{} reps is too many", value)))
}

/// HH:MM:SS
pub fn format_duration(total_seconds: u32) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// MM:SS
pub fn format_rest(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_default_catalog;
    use crate::types::TemplateExercise;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 7, 0, 0).unwrap()
    }

    fn template(sets: &[(&str, Vec<u32>)]) -> WorkoutTemplate {
        let catalog = build_default_catalog();
        WorkoutTemplate {
            id: "tpl".into(),
            name: "Test".into(),
            exercises: sets
                .iter()
                .map(|(id, reps)| {
                    TemplateExercise::with_reps(catalog.get(id).unwrap().clone(), reps)
                })
                .collect(),
        }
    }

    fn reps_of(engine: &WorkoutSessionEngine, index: usize) -> Vec<u32> {
        engine.session().logged_exercises[index].recorded_reps()
    }

    #[test]
    fn test_start_allocates_empty_sets() {
        let engine =
            WorkoutSessionEngine::start(&template(&[("ex1", vec![10, 10]), ("ex2", vec![8])]), t0(), 60)
                .unwrap();

        let session = engine.session();
        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.template_name, "Test");
        assert_eq!(session.logged_exercises[0].logged_sets.len(), 2);
        assert!(session.logged_exercises[0]
            .logged_sets
            .iter()
            .all(|s| s.actual_reps.is_none()));
        assert_eq!(engine.max_rounds(), 2);
        assert_eq!(
            engine.cursor(),
            Some(Cursor {
                exercise_index: 0,
                set_number: 1
            })
        );
        assert_eq!(engine.suggested_reps(), Some(10));
    }

    #[test]
    fn test_start_rejects_exercise_without_sets() {
        let tpl = template(&[("ex1", vec![10]), ("ex2", vec![])]);
        let result = WorkoutSessionEngine::start(&tpl, t0(), 60);
        assert!(matches!(result, Err(Error::Validation(_))));

        let empty = WorkoutTemplate {
            id: "e".into(),
            name: "Empty".into(),
            exercises: vec![],
        };
        assert!(WorkoutSessionEngine::start(&empty, t0(), 60).is_err());
    }

    #[test]
    fn test_start_rejects_gaps_in_set_numbers() {
        let mut gapped = template(&[("ex1", vec![10, 10])]);
        gapped.exercises[0].planned_sets[1].set_number = 3;
        let result = WorkoutSessionEngine::start(&gapped, t0(), 0);
        assert!(matches!(result, Err(Error::Validation(_))));

        let mut repeated = template(&[("ex1", vec![10, 10]), ("ex2", vec![5])]);
        repeated.exercises[0].planned_sets[1].set_number = 1;
        assert!(WorkoutSessionEngine::start(&repeated, t0(), 0).is_err());

        // Renumbered sets start and run to completion
        gapped.exercises[0].planned_sets[1].set_number = 2;
        let mut engine = WorkoutSessionEngine::start(&gapped, t0(), 0).unwrap();
        engine.record_set(10, t0()).unwrap();
        assert_eq!(engine.record_set(9, t0()).unwrap(), RecordOutcome::Completed);
        assert_eq!(engine.session().status, SessionStatus::Completed);
    }

    #[test]
    fn test_two_by_two_scenario_completes_on_fourth_set() {
        crate::logging::init_test();
        let tpl = template(&[("ex1", vec![10, 10]), ("ex2", vec![8, 8])]);
        let mut engine = WorkoutSessionEngine::start(&tpl, t0(), DEFAULT_REST_SECONDS).unwrap();

        let mut now = t0();
        for (i, reps) in [10, 8, 9].into_iter().enumerate() {
            let outcome = engine.record_set(reps, now).unwrap();
            assert_eq!(outcome, RecordOutcome::Resting { seconds: 60 }, "set {}", i);
            assert_eq!(engine.session().status, SessionStatus::InProgress);
            now += Duration::seconds(30);
            engine.skip_rest(now).unwrap();
        }

        let outcome = engine.record_set(7, now + Duration::seconds(40)).unwrap();
        assert_eq!(outcome, RecordOutcome::Completed);

        let session = engine.session();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(reps_of(&engine, 0), vec![10, 9]);
        assert_eq!(reps_of(&engine, 1), vec![8, 7]);
        assert!(session.end_time.unwrap() >= session.start_time);
        assert_eq!(engine.state(), SessionState::Completed);
        assert_eq!(engine.cursor(), None);
    }

    #[test]
    fn test_round_order_visits_every_exercise_per_round() {
        let tpl = template(&[("ex1", vec![5, 5, 5]), ("ex2", vec![5, 5, 5]), ("ex3", vec![5, 5, 5])]);
        let mut engine = WorkoutSessionEngine::start(&tpl, t0(), 0).unwrap();

        let mut visited = Vec::new();
        while let Some(cursor) = engine.cursor() {
            visited.push((cursor.exercise_index, cursor.set_number));
            engine.record_set(5, t0()).unwrap();
        }

        assert_eq!(
            visited,
            vec![
                (0, 1), (1, 1), (2, 1),
                (0, 2), (1, 2), (2, 2),
                (0, 3), (1, 3), (2, 3),
            ]
        );
        assert_eq!(engine.session().status, SessionStatus::Completed);
    }

    #[test]
    fn test_uneven_sets_skip_exhausted_exercises() {
        let tpl = template(&[("ex1", vec![5]), ("ex2", vec![5, 5, 5]), ("ex3", vec![5, 5])]);
        let mut engine = WorkoutSessionEngine::start(&tpl, t0(), 0).unwrap();

        let mut visited = Vec::new();
        while let Some(cursor) = engine.cursor() {
            visited.push((cursor.exercise_index, cursor.set_number));
            engine.record_set(1, t0()).unwrap();
        }

        assert_eq!(
            visited,
            vec![(0, 1), (1, 1), (2, 1), (1, 2), (2, 2), (1, 3)]
        );
        for exercise in &engine.session().logged_exercises {
            assert_eq!(exercise.completed_sets(), exercise.planned_sets.len());
        }
    }

    #[test]
    fn test_record_twice_does_not_double_count() {
        let tpl = template(&[("ex1", vec![10, 10])]);
        let mut engine = WorkoutSessionEngine::start(&tpl, t0(), 60).unwrap();

        engine.record_set(10, t0()).unwrap();
        let cursor = engine.cursor();
        let second = engine.record_set(12, t0());

        assert!(matches!(second, Err(Error::Session(_))));
        assert_eq!(engine.cursor(), cursor);
        assert_eq!(reps_of(&engine, 0), vec![10]);
    }

    #[test]
    fn test_rest_expiry_and_skip_reach_same_cursor() {
        let tpl = template(&[("ex1", vec![10, 10]), ("ex2", vec![8, 8])]);

        let mut expired = WorkoutSessionEngine::start(&tpl, t0(), 3).unwrap();
        expired.record_set(10, t0()).unwrap();
        assert_eq!(expired.tick(t0()), TickOutcome::Ticked);
        assert_eq!(expired.tick(t0()), TickOutcome::Ticked);
        let last = expired.tick(t0());

        let mut skipped = WorkoutSessionEngine::start(&tpl, t0(), 3).unwrap();
        skipped.record_set(10, t0()).unwrap();
        let advance = skipped.skip_rest(t0()).unwrap();

        let expected = Cursor {
            exercise_index: 1,
            set_number: 1,
        };
        assert_eq!(last, TickOutcome::RestFinished(Advance::Moved(expected)));
        assert_eq!(advance, Advance::Moved(expected));
        assert_eq!(expired.cursor(), skipped.cursor());
        assert_eq!(expired.state(), SessionState::Running);
        assert_eq!(skipped.state(), SessionState::Running);

        // The pending advance already ran; a further skip is refused
        assert!(skipped.skip_rest(t0()).is_err());
        assert_eq!(skipped.cursor(), Some(expected));
    }

    #[test]
    fn test_record_blocked_while_resting_or_paused() {
        let tpl = template(&[("ex1", vec![10, 10])]);
        let mut engine = WorkoutSessionEngine::start(&tpl, t0(), 60).unwrap();

        engine.pause().unwrap();
        assert!(engine.record_set(10, t0()).is_err());
        engine.resume().unwrap();

        engine.record_set(10, t0()).unwrap();
        assert!(matches!(engine.state(), SessionState::Resting { .. }));
        assert!(engine.record_set(10, t0()).is_err());
    }

    #[test]
    fn test_elapsed_timer_only_runs_unpaused() {
        let tpl = template(&[("ex1", vec![10, 10])]);
        let mut engine = WorkoutSessionEngine::start(&tpl, t0(), 60).unwrap();

        engine.tick(t0());
        engine.tick(t0());
        engine.toggle_pause().unwrap();
        assert_eq!(engine.tick(t0()), TickOutcome::Idle);
        engine.toggle_pause().unwrap();
        engine.tick(t0());

        assert_eq!(engine.elapsed_seconds(), 3);
    }

    #[test]
    fn test_rest_counts_down_while_paused() {
        let tpl = template(&[("ex1", vec![10, 10])]);
        let mut engine = WorkoutSessionEngine::start(&tpl, t0(), 2).unwrap();

        engine.record_set(10, t0()).unwrap();
        engine.pause().unwrap();
        assert_eq!(
            engine.state(),
            SessionState::Paused {
                rest_remaining: Some(2)
            }
        );
        engine.tick(t0());
        let outcome = engine.tick(t0());

        assert!(matches!(outcome, TickOutcome::RestFinished(Advance::Moved(_))));
        assert_eq!(
            engine.state(),
            SessionState::Paused {
                rest_remaining: None
            }
        );
        assert_eq!(engine.elapsed_seconds(), 0);
        assert_eq!(engine.cursor().unwrap().set_number, 2);
    }

    #[test]
    fn test_manual_finish_keeps_partial_log() {
        let tpl = template(&[("ex1", vec![10, 10]), ("ex2", vec![8, 8])]);
        let mut engine = WorkoutSessionEngine::start(&tpl, t0(), 60).unwrap();

        engine.record_set(11, t0()).unwrap();
        for _ in 0..5 {
            engine.tick(t0());
        }
        let end = t0() + Duration::minutes(5);
        let session = engine.finish(end).unwrap().clone();

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.end_time, Some(end));
        assert_eq!(session.duration_seconds, Some(5));
        assert_eq!(session.logged_exercises[0].recorded_reps(), vec![11]);
        assert_eq!(session.logged_exercises[1].completed_sets(), 0);

        assert_eq!(engine.tick(end), TickOutcome::Idle);
        assert!(engine.finish(end).is_err());
    }

    #[test]
    fn test_cancel_discards() {
        let tpl = template(&[("ex1", vec![10])]);
        let mut engine = WorkoutSessionEngine::start(&tpl, t0(), 60).unwrap();

        engine.cancel().unwrap();
        assert_eq!(engine.session().status, SessionStatus::Cancelled);
        assert_eq!(engine.tick(t0()), TickOutcome::Idle);
        assert!(engine.record_set(1, t0()).is_err());
        assert!(engine.finish(t0()).is_err());
    }

    #[test]
    fn test_record_set_input_validation() {
        let tpl = template(&[("ex1", vec![10, 10])]);
        let mut engine = WorkoutSessionEngine::start(&tpl, t0(), 60).unwrap();

        for bad in ["", "  ", "ten", "-3", "4.5"] {
            let result = engine.record_set_input(bad, t0());
            assert!(
                matches!(result, Err(Error::Validation(_))),
                "input {:?} should be rejected",
                bad
            );
        }
        assert_eq!(engine.state(), SessionState::Running);
        assert_eq!(reps_of(&engine, 0), Vec::<u32>::new());

        engine.record_set_input(" 0 ", t0()).unwrap();
        assert_eq!(reps_of(&engine, 0), vec![0]);
    }

    #[test]
    fn test_end_time_never_precedes_start() {
        let tpl = template(&[("ex1", vec![10])]);
        let mut engine = WorkoutSessionEngine::start(&tpl, t0(), 60).unwrap();
        engine.record_set(10, t0() - Duration::hours(1)).unwrap();
        let session = engine.session();
        assert_eq!(session.end_time, Some(session.start_time));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_duration(3725), "01:02:05");
        assert_eq!(format_rest(60), "01:00");
        assert_eq!(format_rest(9), "00:09");
    }
}
