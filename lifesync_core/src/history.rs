//! Completed workout session history.
//!
//! Only completed sessions are ever appended; cancelled ones are discarded by
//! the engine and rejected here.

use crate::catalog::ExerciseCatalog;
use crate::store::Collection;
use crate::types::{Exercise, SessionStatus, WorkoutSession};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Best set of one exercise in one session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressPoint {
    pub performed_at: DateTime<Utc>,
    pub max_reps: u32,
}

pub struct SessionHistory<C> {
    collection: C,
}

impl<C: Collection<WorkoutSession>> SessionHistory<C> {
    pub fn new(collection: C) -> Self {
        Self { collection }
    }

    /// Append a finished session to the history
    pub fn append(&mut self, session: &WorkoutSession) -> Result<()> {
        if session.status != SessionStatus::Completed {
            return Err(Error::Session(format!(
                "Only completed sessions are kept in history (session {} is {:?})",
                session.id, session.status
            )));
        }

        let mut sessions = self.collection.load_all()?;
        if sessions.iter().any(|s| s.id == session.id) {
            return Err(Error::Session(format!(
                "Session {} is already in history",
                session.id
            )));
        }
        sessions.push(session.clone());
        self.collection.save_all(&sessions)?;

        tracing::info!(
            "Appended session {} ('{}') to history",
            session.id,
            session.template_name
        );
        Ok(())
    }

    /// All sessions sorted by start time, newest first
    pub fn list_newest_first(&self) -> Result<Vec<WorkoutSession>> {
        let mut sessions = self.collection.load_all()?;
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(sessions)
    }

    /// Max reps per session for one exercise, oldest first
    ///
    /// Sessions where the exercise was skipped or logged zero reps are left
    /// out.
    pub fn exercise_progress(&self, exercise_id: &str) -> Result<Vec<ProgressPoint>> {
        let mut sessions = self.collection.load_all()?;
        sessions.sort_by(|a, b| a.start_time.cmp(&b.start_time));

        Ok(sessions
            .iter()
            .filter_map(|session| {
                let logged = session
                    .logged_exercises
                    .iter()
                    .find(|e| e.exercise_id == exercise_id)?;
                let max_reps = logged.recorded_reps().into_iter().max().unwrap_or(0);
                (max_reps > 0).then(|| ProgressPoint {
                    performed_at: session.start_time,
                    max_reps,
                })
            })
            .collect())
    }

    /// Catalog exercises that appear in any session, sorted by name
    pub fn performed_exercises<'a>(&self, catalog: &'a ExerciseCatalog) -> Result<Vec<&'a Exercise>> {
        let sessions = self.collection.load_all()?;
        let ids: HashSet<&str> = sessions
            .iter()
            .flat_map(|s| s.logged_exercises.iter().map(|e| e.exercise_id.as_str()))
            .collect();

        let mut exercises: Vec<&Exercise> = catalog
            .all()
            .iter()
            .filter(|e| ids.contains(e.id.as_str()))
            .collect();
        exercises.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(exercises)
    }
}
