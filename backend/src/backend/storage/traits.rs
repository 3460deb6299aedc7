//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::backend::domain::models::{AppSettings, Lesson, Student};

/// Trait defining the interface for student storage operations
///
/// This trait abstracts away the specific storage implementation details,
/// allowing the domain layer to work with different storage backends
/// (flat files, SQL databases, etc.) without modification.
#[async_trait]
pub trait StudentStorage: Send + Sync {
    /// Store a new student
    async fn store_student(&self, student: &Student) -> Result<()>;

    /// Retrieve a specific student by ID
    async fn get_student(&self, student_id: &str) -> Result<Option<Student>>;

    /// List all students ordered by display name
    async fn list_students(&self) -> Result<Vec<Student>>;

    /// Update an existing student
    async fn update_student(&self, student: &Student) -> Result<()>;

    /// Delete a student by ID, removing its stored lessons with it
    async fn delete_student(&self, student_id: &str) -> Result<()>;
}

/// Trait defining the interface for lesson storage operations
#[async_trait]
pub trait LessonStorage: Send + Sync {
    /// Store a new lesson under its owning student
    async fn store_lesson(&self, lesson: &Lesson) -> Result<()>;

    /// Retrieve a specific lesson by ID
    async fn get_lesson(&self, lesson_id: &str) -> Result<Option<Lesson>>;

    /// List the lessons of one student ordered by date ascending
    async fn list_lessons_for_student(&self, student_id: &str) -> Result<Vec<Lesson>>;

    /// List every stored lesson ordered by date ascending
    async fn list_all_lessons(&self) -> Result<Vec<Lesson>>;

    /// List the lessons of one calendar month ordered by date ascending
    async fn list_lessons_in_month(&self, year: i32, month: u32) -> Result<Vec<Lesson>>;

    /// List lessons with a start instant inside `[start, end)`, ordered by
    /// date ascending
    async fn list_lessons_in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Lesson>>;

    /// Update an existing lesson in place (same owning student)
    async fn update_lesson(&self, lesson: &Lesson) -> Result<()>;

    /// Delete a single lesson
    /// Returns true if the lesson was found and deleted, false otherwise
    async fn delete_lesson(&self, student_id: &str, lesson_id: &str) -> Result<bool>;

    /// Delete every lesson of one student
    /// Returns the number of lessons actually deleted
    async fn delete_lessons_for_student(&self, student_id: &str) -> Result<u32>;
}

/// Trait defining the interface for the process-wide settings record
#[async_trait]
pub trait SettingsStorage: Send + Sync {
    /// Load the settings record, creating the default one on first use
    async fn get_settings(&self) -> Result<AppSettings>;

    /// Persist the settings record
    async fn update_settings(&self, settings: &AppSettings) -> Result<()>;
}

/// Trait defining the interface for storage connections
///
/// This trait abstracts away the specific connection type (flat files, a
/// database, etc.) and provides factory methods for creating repositories.
/// This allows the domain layer to work with any storage backend without
/// knowing the implementation details.
pub trait Connection: Send + Sync + Clone {
    /// The type of StudentStorage this connection creates
    type StudentRepository: StudentStorage + Clone;

    /// The type of LessonStorage this connection creates
    type LessonRepository: LessonStorage + Clone;

    /// The type of SettingsStorage this connection creates
    type SettingsRepository: SettingsStorage + Clone;

    /// Create a new student repository for this connection
    fn create_student_repository(&self) -> Self::StudentRepository;

    /// Create a new lesson repository for this connection
    fn create_lesson_repository(&self) -> Self::LessonRepository;

    /// Create a new settings repository for this connection
    fn create_settings_repository(&self) -> Self::SettingsRepository;
}
