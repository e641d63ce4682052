//! Persisted record collections with file locking.
//!
//! Every kind of record (templates, habits, session history) is stored as a
//! whole collection: the full set is loaded, mutated in memory, and written
//! back in one piece. There are no partial or delta writes.

use crate::types::Record;
use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A persisted collection of records of one kind
pub trait Collection<T: Record + Clone> {
    /// All persisted records; empty if nothing has been saved yet
    fn load_all(&self) -> Result<Vec<T>>;

    /// Overwrite the entire persisted set
    fn save_all(&mut self, records: &[T]) -> Result<()>;

    /// Insert a record, or replace the one with the same id in place
    fn put(&mut self, record: T) -> Result<()> {
        let mut records = self.load_all()?;
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.save_all(&records)
    }

    /// Remove a record by id, returning it
    fn delete(&mut self, id: &str) -> Result<T> {
        let mut records = self.load_all()?;
        let index = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let removed = records.remove(index);
        self.save_all(&records)?;
        Ok(removed)
    }

    fn get(&self, id: &str) -> Result<T> {
        self.load_all()?
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}

/// JSON-array file collection
///
/// Reads take a shared lock; writes go to a locked temp file in the same
/// directory which is synced and renamed over the original.
pub struct JsonFileCollection<T> {
    path: PathBuf,
    _record: PhantomData<T>,
}

impl<T> JsonFileCollection<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Collection<T> for JsonFileCollection<T>
where
    T: Record + Clone + Serialize + DeserializeOwned,
{
    /// Returns an empty collection if the file is missing.
    /// If the file is corrupted, logs a warning and returns an empty collection.
    fn load_all(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            tracing::debug!("No collection file at {:?}, starting empty", self.path);
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Vec<T>>(&contents) {
            Ok(records) => {
                tracing::debug!("Loaded {} records from {:?}", records.len(), self.path);
                Ok(records)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse collection file {:?}: {}. Starting empty.",
                    self.path,
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    fn save_all(&mut self, records: &[T]) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let temp = NamedTempFile::new_in(&parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, records)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} records to {:?}", records.len(), self.path);
        Ok(())
    }
}

/// In-memory collection, used by tests and dry runs
#[derive(Clone, Debug, Default)]
pub struct MemoryCollection<T> {
    records: Vec<T>,
}

impl<T> MemoryCollection<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn with_records(records: Vec<T>) -> Self {
        Self { records }
    }
}

impl<T: Record + Clone> Collection<T> for MemoryCollection<T> {
    fn load_all(&self) -> Result<Vec<T>> {
        Ok(self.records.clone())
    }

    fn save_all(&mut self, records: &[T]) -> Result<()> {
        self.records = records.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Habit, HabitTracking};
    use chrono::NaiveDate;

    fn habit(id: &str, name: &str) -> Habit {
        Habit {
            id: id.into(),
            name: name.into(),
            tracking: HabitTracking::Time {
                total_time_logged: 5,
                target_time: 15,
            },
            last_tracked_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            completed_today: false,
            streak: 2,
            completion_history: vec![
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            ],
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("habits.json");

        let mut collection = JsonFileCollection::<Habit>::new(&path);
        collection.save_all(&[habit("h1", "Read")]).unwrap();

        let loaded = collection.load_all().unwrap();
        assert_eq!(loaded, vec![habit("h1", "Read")]);
    }

    #[test]
    fn test_record_shape_on_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("habits.json");

        let mut collection = JsonFileCollection::<Habit>::new(&path);
        collection.put(habit("h1", "Read")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let record = &raw[0];
        assert_eq!(record["trackingType"], "time");
        assert_eq!(record["totalTimeLogged"], 5);
        assert_eq!(record["lastTrackedDate"], "2024-01-02");
        assert_eq!(record["completionHistory"][0], "2024-01-01");
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let collection = JsonFileCollection::<Habit>::new(temp_dir.path().join("missing.json"));
        assert!(collection.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_corrupted_file_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("corrupted.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let collection = JsonFileCollection::<Habit>::new(&path);
        assert!(collection.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_put_replaces_in_place() {
        let mut collection = MemoryCollection::new();
        collection.put(habit("h1", "Read")).unwrap();
        collection.put(habit("h2", "Walk")).unwrap();
        collection.put(habit("h1", "Read more")).unwrap();

        let records = collection.load_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Read more");
        assert_eq!(records[1].name, "Walk");
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let mut collection = MemoryCollection::with_records(vec![habit("h1", "Read")]);
        let result = collection.delete("nope");
        assert!(matches!(result, Err(Error::NotFound(_))));

        let removed = collection.delete("h1").unwrap();
        assert_eq!(removed.name, "Read");
        assert!(collection.get("h1").is_err());
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("habits.json");

        let mut collection = JsonFileCollection::<Habit>::new(&path);
        collection.save_all(&[habit("h1", "Read")]).unwrap();
        collection.delete("h1").unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "habits.json")
            .collect();
        assert!(extras.is_empty(), "found extras: {:?}", extras);
        assert!(collection.load_all().unwrap().is_empty());
    }
}
