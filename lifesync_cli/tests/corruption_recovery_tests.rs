//! Corruption recovery tests for lifesync.
//!
//! These tests verify the CLI keeps working when:
//! - Collection files contain invalid JSON
//! - Collection files are empty
//! - The data directory does not exist yet

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("lifesync"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_habits_file_starts_empty() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("habits.json"), "{ invalid json }}}}")
        .expect("Failed to write corrupted habits");

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["habit", "list", "--today", "2024-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No habits yet."));

    // Adding a habit replaces the corrupted file with a valid one
    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["habit", "add", "--name", "Walk", "--today", "2024-01-01"])
        .assert()
        .success();

    let contents = fs::read_to_string(data_dir.join("habits.json")).unwrap();
    let habits: serde_json::Value = serde_json::from_str(&contents).expect("Habits not rewritten");
    assert_eq!(habits.as_array().unwrap().len(), 1);
    assert_eq!(habits[0]["trackingType"], "checkbox");
}

#[test]
fn test_corrupted_templates_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("workout_templates.json"), "[{\"id\": ")
        .expect("Failed to write truncated templates");

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["template", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No workout templates yet."));
}

#[test]
fn test_corrupted_history_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("completed_workout_sessions.json"), "not json at all")
        .expect("Failed to write corrupted history");

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["workout", "history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No completed workouts yet."));
}

#[test]
fn test_empty_collection_files() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("habits.json"), "").unwrap();
    fs::write(data_dir.join("workout_templates.json"), "   \n").unwrap();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["habit", "list"])
        .assert()
        .success();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["template", "list"])
        .assert()
        .success();
}

#[test]
fn test_missing_data_dir_is_created_on_write() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("nested").join("lifesync");

    cli()
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["habit", "list"])
        .assert()
        .success();
    assert!(!data_dir.exists());

    cli()
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["habit", "add", "--name", "Read", "--minutes", "20"])
        .assert()
        .success();
    assert!(data_dir.join("habits.json").exists());
}
