//! # CSV Storage Module
//!
//! File-based storage for the lesson tracker. Students live in one directory
//! each with a YAML record, their lessons in a CSV file next to it, and a
//! single YAML file at the root holds application settings. Everything is
//! plain files so a data directory can be inspected, backed up or synced with
//! ordinary tools.
//!
//! ## File Format
//!
//! ```text
//! Lesson Tracker/
//! ├── settings.yaml
//! └── anna_nowak/
//!     ├── student.yaml
//!     └── lessons.csv
//! ```
//!
//! Lesson CSV files have the following structure:
//! ```csv
//! id,student_id,date,duration_hours,hourly_rate,paid,notes,calendar_event_id,synced_with_calendar,created_at,updated_at
//! lesson::9f0c...,student::5a2b...,2025-03-03T10:00:00,1.0,60.0,false,,,false,2025-03-01T09:00:00+00:00,2025-03-01T09:00:00+00:00
//! ```

pub mod connection;
pub mod lesson_repository;
pub mod settings_repository;
pub mod student_repository;

pub use connection::CsvConnection;
pub use lesson_repository::LessonRepository;
pub use settings_repository::SettingsRepository;
pub use student_repository::StudentRepository;
