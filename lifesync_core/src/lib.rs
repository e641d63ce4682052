#![forbid(unsafe_code)]

//! Core domain model and business logic for LifeSync.
//!
//! This crate provides:
//! - Domain types (exercises, templates, sessions, habits)
//! - The built-in exercise catalog
//! - The guided workout session engine
//! - Daily habit progress tracking and streaks
//! - Persistence (JSON collections, CSV export)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod engine;
pub mod template;
pub mod habit;
pub mod habit_book;
pub mod history;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog, ExerciseCatalog};
pub use config::Config;
pub use store::{Collection, JsonFileCollection, MemoryCollection};
pub use engine::{
    format_duration, format_rest, parse_reps, Advance, Cursor, RecordOutcome, SessionState,
    TickOutcome, WorkoutSessionEngine, DEFAULT_REST_SECONDS,
};
pub use template::TemplateLibrary;
pub use habit_book::HabitBook;
pub use history::{ProgressPoint, SessionHistory};
pub use csv_export::export_sessions_csv;
