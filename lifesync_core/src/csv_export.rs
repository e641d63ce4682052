//! CSV export of workout session history.
//!
//! One row per logged set, so the file can be opened in a spreadsheet and
//! pivoted by exercise or date.

use crate::types::WorkoutSession;
use crate::Result;
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    session_id: &'a str,
    template_name: &'a str,
    start_time: String,
    end_time: Option<String>,
    duration_seconds: Option<u32>,
    exercise_id: &'a str,
    exercise_name: &'a str,
    body_part: &'a str,
    set_number: u32,
    planned_reps: Option<u32>,
    actual_reps: Option<u32>,
}

/// Write every logged set of `sessions` to a new CSV file at `path`
///
/// Existing files are replaced. Returns the number of rows written.
pub fn export_sessions_csv(sessions: &[WorkoutSession], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(File::create(path)?);

    let mut rows = 0;
    for session in sessions {
        let start_time = session.start_time.to_rfc3339();
        let end_time = session.end_time.map(|t| t.to_rfc3339());

        for exercise in &session.logged_exercises {
            for set in &exercise.logged_sets {
                let planned_reps = exercise
                    .planned_sets
                    .iter()
                    .find(|p| p.set_number == set.set_number)
                    .map(|p| p.reps);

                writer.serialize(CsvRow {
                    session_id: &session.id,
                    template_name: &session.template_name,
                    start_time: start_time.clone(),
                    end_time: end_time.clone(),
                    duration_seconds: session.duration_seconds,
                    exercise_id: &exercise.exercise_id,
                    exercise_name: &exercise.exercise_name,
                    body_part: &exercise.body_part,
                    set_number: set.set_number,
                    planned_reps,
                    actual_reps: set.actual_reps,
                })?;
                rows += 1;
            }
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} sets from {} sessions to {:?}", rows, sessions.len(), path);
    Ok(rows)
}
