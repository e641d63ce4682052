//! Built-in exercise catalog.
//!
//! Exercises are immutable reference data; templates copy the entries they use.

use crate::types::Exercise;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Body-part filter value that matches every exercise
pub const ALL_BODY_PARTS: &str = "All";

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<ExerciseCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static ExerciseCatalog {
    &DEFAULT_CATALOG
}

/// Ordered collection of catalog exercises
#[derive(Clone, Debug)]
pub struct ExerciseCatalog {
    exercises: Vec<Exercise>,
}

impl ExerciseCatalog {
    pub fn new(exercises: Vec<Exercise>) -> Self {
        Self { exercises }
    }

    pub fn all(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn get(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    /// Distinct body parts in catalog order
    pub fn body_parts(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.exercises
            .iter()
            .map(|e| e.body_part.as_str())
            .filter(|part| seen.insert(*part))
            .collect()
    }

    /// Exercises matching a body part (or [`ALL_BODY_PARTS`]) and a
    /// case-insensitive name search
    pub fn filter(&self, body_part: Option<&str>, search: Option<&str>) -> Vec<&Exercise> {
        let needle = search.map(|s| s.trim().to_lowercase());
        self.exercises
            .iter()
            .filter(|e| match body_part {
                None | Some(ALL_BODY_PARTS) => true,
                Some(part) => e.body_part.eq_ignore_ascii_case(part),
            })
            .filter(|e| match &needle {
                Some(n) if !n.is_empty() => e.name.to_lowercase().contains(n.as_str()),
                _ => true,
            })
            .collect()
    }

    /// Validate the catalog, returning a list of problems
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut ids = HashSet::new();

        for exercise in &self.exercises {
            if !ids.insert(exercise.id.as_str()) {
                errors.push(format!("Duplicate exercise id: {}", exercise.id));
            }
            if exercise.name.trim().is_empty() {
                errors.push(format!("Exercise {} has an empty name", exercise.id));
            }
            if exercise.body_part.trim().is_empty() {
                errors.push(format!("Exercise {} has no body part", exercise.id));
            }
        }

        errors
    }
}

fn exercise(id: &str, name: &str, body_part: &str, description: &str) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        body_part: body_part.into(),
        description: Some(description.into()),
    }
}

/// Builds the default catalog
///
/// Prefer [`get_default_catalog`] outside of tests.
pub fn build_default_catalog() -> ExerciseCatalog {
    ExerciseCatalog::new(vec![
        exercise("ex1", "Push-ups", "Chest", "Bodyweight exercise for chest, shoulders, and triceps."),
        exercise("ex2", "Squats", "Legs", "Compound exercise for legs and glutes."),
        exercise("ex3", "Deadlifts", "Back", "Full body strength exercise, primarily back and legs."),
        exercise("ex4", "Bench Press", "Chest", "Barbell exercise for chest strength."),
        exercise("ex5", "Overhead Press", "Shoulders", "Barbell or dumbbell exercise for shoulder strength."),
        exercise("ex6", "Bicep Curls", "Arms", "Isolation exercise for biceps."),
        exercise("ex7", "Tricep Extensions", "Arms", "Isolation exercise for triceps."),
        exercise("ex8", "Lunges", "Legs", "Unilateral exercise for legs and glutes."),
        exercise("ex9", "Plank", "Core", "Isometric exercise for core strength."),
        exercise("ex10", "Crunches", "Core", "Traditional exercise for abdominal muscles."),
        exercise("ex11", "Rows (Dumbbell/Barbell)", "Back", "Pulling exercise for back muscles."),
        exercise("ex12", "Lateral Raises", "Shoulders", "Isolation exercise for side deltoids."),
        exercise("ex13", "Calf Raises", "Legs", "Isolation exercise for calf muscles."),
        exercise("ex14", "Pull-ups", "Back", "Bodyweight exercise for back and biceps."),
        exercise("ex15", "Dips", "Triceps", "Bodyweight exercise for triceps and chest."),
        exercise("ex16", "Leg Press", "Legs", "Machine-based exercise for quadriceps and glutes."),
        exercise("ex17", "Leg Curls", "Legs", "Isolation exercise for hamstrings."),
        exercise("ex18", "Leg Extensions", "Legs", "Isolation exercise for quadriceps."),
        exercise("ex19", "Russian Twists", "Core", "Oblique exercise."),
        exercise("ex20", "Burpees", "Full Body", "High-intensity full-body exercise."),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.all().len(), 20);
        assert!(catalog.validate().is_empty());
    }

    #[test]
    fn test_duplicate_ids_reported() {
        let catalog = ExerciseCatalog::new(vec![
            exercise("a", "One", "Legs", ""),
            exercise("a", "Two", "Legs", ""),
        ]);
        let errors = catalog.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Duplicate"));
    }

    #[test]
    fn test_filter_by_body_part_and_search() {
        let catalog = get_default_catalog();

        let legs = catalog.filter(Some("legs"), None);
        assert_eq!(legs.len(), 6);

        let curls = catalog.filter(Some("Legs"), Some("CURL"));
        assert_eq!(curls.len(), 1);
        assert_eq!(curls[0].id, "ex17");

        let all = catalog.filter(Some(ALL_BODY_PARTS), Some(""));
        assert_eq!(all.len(), 20);
    }

    #[test]
    fn test_body_parts_are_distinct() {
        let parts = get_default_catalog().body_parts();
        assert_eq!(parts.first(), Some(&"Chest"));
        assert!(parts.contains(&"Full Body"));
        let unique: HashSet<_> = parts.iter().collect();
        assert_eq!(unique.len(), parts.len());
    }
}
