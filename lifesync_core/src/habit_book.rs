//! Habit records over a persisted collection.
//!
//! Every operation reconciles the touched habit for `today` first and writes
//! the whole collection back afterwards.

use crate::habit;
use crate::store::Collection;
use crate::types::{Habit, HabitKind, HabitTracking};
use crate::{Error, Result};
use chrono::NaiveDate;

pub struct HabitBook<C> {
    collection: C,
}

impl<C: Collection<Habit>> HabitBook<C> {
    pub fn new(collection: C) -> Self {
        Self { collection }
    }

    /// All habits as of `today`, with rollovers persisted
    pub fn list(&mut self, today: NaiveDate) -> Result<Vec<Habit>> {
        let stored = self.collection.load_all()?;
        let reconciled: Vec<Habit> = stored.iter().map(|h| habit::reconcile(h, today)).collect();
        if reconciled != stored {
            self.collection.save_all(&reconciled)?;
            tracing::debug!("Reconciled habits for {}", today);
        }
        Ok(reconciled)
    }

    pub fn get(&mut self, id: &str, today: NaiveDate) -> Result<Habit> {
        Ok(habit::reconcile(&self.collection.get(id)?, today))
    }

    pub fn add(&mut self, name: &str, tracking: HabitTracking, today: NaiveDate) -> Result<Habit> {
        let created = habit::create(name, tracking, today)?;
        self.collection.put(created.clone())?;
        tracing::info!("Added habit '{}' ({})", created.name, created.id);
        Ok(created)
    }

    pub fn edit(
        &mut self,
        id: &str,
        name: &str,
        tracking: HabitTracking,
        today: NaiveDate,
    ) -> Result<Habit> {
        let existing = self.collection.get(id)?;
        let edited = habit::edit(&existing, name, tracking, today)?;
        self.collection.put(edited.clone())?;
        tracing::info!("Edited habit '{}' ({})", edited.name, edited.id);
        Ok(edited)
    }

    /// Delete after the caller confirms; returns false if declined
    pub fn delete<F>(&mut self, id: &str, confirm: F) -> Result<bool>
    where
        F: FnOnce(&Habit) -> bool,
    {
        let existing = self.collection.get(id)?;
        if !confirm(&existing) {
            tracing::debug!("Deletion of habit {} declined", id);
            return Ok(false);
        }
        self.collection.delete(id)?;
        tracing::info!("Deleted habit '{}' ({})", existing.name, id);
        Ok(true)
    }

    /// Change a checkbox habit's count by `delta`
    pub fn track(&mut self, id: &str, delta: i64, today: NaiveDate) -> Result<Habit> {
        let existing = self.collection.get(id)?;
        if existing.tracking.kind() != HabitKind::Checkbox {
            return Err(Error::Validation(format!(
                "'{}' is tracked by time; log minutes instead",
                existing.name
            )));
        }
        self.apply(existing, delta, today)
    }

    /// Log minutes typed by the user against a time habit
    pub fn log_time(&mut self, id: &str, input: &str, today: NaiveDate) -> Result<Habit> {
        let minutes = habit::parse_minutes(input)?;
        let existing = self.collection.get(id)?;
        if existing.tracking.kind() != HabitKind::Time {
            return Err(Error::Validation(format!(
                "'{}' is a checkbox habit; track it instead",
                existing.name
            )));
        }
        self.apply(existing, i64::from(minutes), today)
    }

    fn apply(&mut self, existing: Habit, delta: i64, today: NaiveDate) -> Result<Habit> {
        let updated = habit::apply_progress(&existing, delta, today);
        self.collection.put(updated.clone())?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::tracking_for;
    use crate::store::{JsonFileCollection, MemoryCollection};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_track_across_days_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("habits.json");

        let mut book = HabitBook::new(JsonFileCollection::new(&path));
        let water = book
            .add("Water", tracking_for(HabitKind::Checkbox, 2), day("2024-01-01"))
            .unwrap();

        book.track(&water.id, 1, day("2024-01-01")).unwrap();
        let done = book.track(&water.id, 1, day("2024-01-01")).unwrap();
        assert!(done.completed_today);

        // A fresh book over the same file sees the rollover on the next day
        let mut reopened = HabitBook::new(JsonFileCollection::<Habit>::new(&path));
        let habits = reopened.list(day("2024-01-02")).unwrap();
        assert_eq!(habits[0].tracking.progress(), 0);
        assert_eq!(habits[0].streak, 1);

        let next = reopened.track(&water.id, 2, day("2024-01-02")).unwrap();
        assert_eq!(next.streak, 2);
        assert_eq!(
            next.completion_history,
            vec![day("2024-01-01"), day("2024-01-02")]
        );
    }

    #[test]
    fn test_list_persists_streak_reset() {
        let mut book = HabitBook::new(MemoryCollection::new());
        let water = book
            .add("Water", tracking_for(HabitKind::Checkbox, 1), day("2024-01-01"))
            .unwrap();
        book.track(&water.id, 1, day("2024-01-01")).unwrap();

        let habits = book.list(day("2024-01-05")).unwrap();
        assert_eq!(habits[0].streak, 0);
        assert_eq!(book.get(&water.id, day("2024-01-05")).unwrap().streak, 0);
    }

    #[test]
    fn test_log_time_validates_input_and_kind() {
        let mut book = HabitBook::new(MemoryCollection::new());
        let today = day("2024-03-01");
        let reading = book.add("Read", tracking_for(HabitKind::Time, 15), today).unwrap();
        let water = book.add("Water", tracking_for(HabitKind::Checkbox, 8), today).unwrap();

        assert!(book.log_time(&reading.id, "0", today).is_err());
        assert!(book.log_time(&water.id, "10", today).is_err());
        assert!(book.track(&reading.id, 1, today).is_err());

        let logged = book.log_time(&reading.id, "20", today).unwrap();
        assert_eq!(logged.tracking.progress(), 20);
        assert!(logged.completed_today);
    }

    #[test]
    fn test_edit_and_delete() {
        let mut book = HabitBook::new(MemoryCollection::new());
        let today = day("2024-03-01");
        let water = book.add("Water", tracking_for(HabitKind::Checkbox, 8), today).unwrap();

        let edited = book
            .edit(&water.id, "Water glasses", tracking_for(HabitKind::Checkbox, 6), today)
            .unwrap();
        assert_eq!(edited.tracking.target(), 6);

        assert!(!book.delete(&water.id, |_| false).unwrap());
        assert_eq!(book.list(today).unwrap().len(), 1);
        assert!(book.delete(&water.id, |_| true).unwrap());
        assert!(book.list(today).unwrap().is_empty());
    }
}
