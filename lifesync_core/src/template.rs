//! Workout templates: drafting helpers, validation and the template library.

use crate::engine::WorkoutSessionEngine;
use crate::store::Collection;
use crate::types::{Exercise, PlannedSet, TemplateExercise, WorkoutTemplate};
use crate::{new_id, Error, Result};
use chrono::{DateTime, Utc};

impl TemplateExercise {
    /// A template exercise with one planned set per entry in `reps`
    pub fn with_reps(exercise: Exercise, reps: &[u32]) -> Self {
        let mut te = Self {
            exercise,
            planned_sets: Vec::with_capacity(reps.len()),
        };
        for &r in reps {
            te.add_planned_set(r);
        }
        te
    }

    /// Append a set numbered one past the current highest
    pub fn add_planned_set(&mut self, reps: u32) -> &PlannedSet {
        let set_number = self
            .planned_sets
            .iter()
            .map(|s| s.set_number)
            .max()
            .unwrap_or(0)
            + 1;
        self.planned_sets.push(PlannedSet {
            id: format!("{}-set-{}", self.exercise.id, new_id()),
            set_number,
            reps,
        });
        &self.planned_sets[self.planned_sets.len() - 1]
    }

    /// Remove a set and renumber the rest contiguously from 1
    pub fn remove_planned_set(&mut self, set_number: u32) -> bool {
        let before = self.planned_sets.len();
        self.planned_sets.retain(|s| s.set_number != set_number);
        if self.planned_sets.len() == before {
            return false;
        }
        for (index, set) in self.planned_sets.iter_mut().enumerate() {
            set.set_number = index as u32 + 1;
        }
        true
    }

    /// Set numbers run 1, 2, 3, ... in order
    pub(crate) fn has_contiguous_sets(&self) -> bool {
        self.planned_sets
            .iter()
            .enumerate()
            .all(|(index, set)| set.set_number == index as u32 + 1)
    }
}

impl WorkoutTemplate {
    pub fn new(name: &str, exercises: Vec<TemplateExercise>) -> Self {
        Self {
            id: new_id(),
            name: name.trim().to_string(),
            exercises,
        }
    }

    /// Add the exercise with a single planned set, or remove it if present
    ///
    /// Returns true if the exercise is now part of the template.
    pub fn toggle_exercise(&mut self, exercise: &Exercise, reps: u32) -> bool {
        if let Some(index) = self
            .exercises
            .iter()
            .position(|e| e.exercise.id == exercise.id)
        {
            self.exercises.remove(index);
            false
        } else {
            self.exercises
                .push(TemplateExercise::with_reps(exercise.clone(), &[reps]));
            true
        }
    }

    /// Move the exercise at `from` so that it ends up at `to`
    pub fn reorder_exercise(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.exercises.len();
        if from >= len || to >= len {
            return Err(Error::Validation(format!(
                "Cannot move exercise {} to {} in a template of {}",
                from, to, len
            )));
        }
        let moved = self.exercises.remove(from);
        self.exercises.insert(to, moved);
        Ok(())
    }

    pub fn exercise_mut(&mut self, exercise_id: &str) -> Option<&mut TemplateExercise> {
        self.exercises
            .iter_mut()
            .find(|e| e.exercise.id == exercise_id)
    }

    /// Check the template can be saved and started
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(
                "Workout template name is required.".into(),
            ));
        }
        if self.exercises.is_empty() {
            return Err(Error::Validation(
                "Please select at least one exercise for your template.".into(),
            ));
        }
        if self.exercises.iter().any(|e| e.planned_sets.is_empty()) {
            return Err(Error::Validation(
                "All selected exercises must have at least one planned set with reps filled."
                    .into(),
            ));
        }
        if let Some(bad) = self.exercises.iter().find(|e| !e.has_contiguous_sets()) {
            return Err(Error::Validation(format!(
                "Planned sets for '{}' must be numbered 1, 2, 3, ...",
                bad.exercise.name
            )));
        }
        Ok(())
    }
}

/// Saved workout templates over a persisted collection
pub struct TemplateLibrary<C> {
    collection: C,
}

impl<C: Collection<WorkoutTemplate>> TemplateLibrary<C> {
    pub fn new(collection: C) -> Self {
        Self { collection }
    }

    pub fn list(&self) -> Result<Vec<WorkoutTemplate>> {
        self.collection.load_all()
    }

    pub fn get(&self, id: &str) -> Result<WorkoutTemplate> {
        self.collection.get(id)
    }

    /// Validate and save a new template
    pub fn create(&mut self, mut template: WorkoutTemplate) -> Result<WorkoutTemplate> {
        template.name = template.name.trim().to_string();
        template.validate()?;
        if self.collection.get(&template.id).is_ok() {
            return Err(Error::Validation(format!(
                "A template with id {} already exists",
                template.id
            )));
        }
        self.collection.put(template.clone())?;
        tracing::info!("Created template '{}' ({})", template.name, template.id);
        Ok(template)
    }

    /// Replace an existing template's name and exercises
    pub fn update(
        &mut self,
        id: &str,
        name: &str,
        exercises: Vec<TemplateExercise>,
    ) -> Result<WorkoutTemplate> {
        let mut template = self.collection.get(id)?;
        template.name = name.trim().to_string();
        template.exercises = exercises;
        template.validate()?;
        self.collection.put(template.clone())?;
        tracing::info!("Updated template '{}' ({})", template.name, template.id);
        Ok(template)
    }

    /// Delete after the caller confirms; returns false if declined
    pub fn delete<F>(&mut self, id: &str, confirm: F) -> Result<bool>
    where
        F: FnOnce(&WorkoutTemplate) -> bool,
    {
        let template = self.collection.get(id)?;
        if !confirm(&template) {
            tracing::debug!("Deletion of template {} declined", id);
            return Ok(false);
        }
        self.collection.delete(id)?;
        tracing::info!("Deleted template '{}' ({})", template.name, id);
        Ok(true)
    }

    /// Start a guided session from a saved template
    pub fn start(
        &self,
        id: &str,
        now: DateTime<Utc>,
        rest_seconds: u32,
    ) -> Result<WorkoutSessionEngine> {
        let template = self.collection.get(id)?;
        WorkoutSessionEngine::start(&template, now, rest_seconds)
    }
}
