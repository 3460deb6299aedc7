//! Student management domain logic.
//!
//! Students are the anchor of every other record: lessons hang off them and
//! the billing report groups by their billing ID. Deleting a student
//! cascades over the lesson history, reconciling each synced calendar event
//! before the files go away. A failed event removal is counted, logged and
//! never blocks the delete.

use anyhow::Result;
use chrono::{Local, Utc};
use log::{info, warn};
use std::sync::Arc;

use crate::backend::domain::commands::students::{
    CreateStudentCommand, DeleteStudentResult, StudentDetailResult, StudentListResult,
    StudentResult, UpdateStudentCommand,
};
use crate::backend::domain::models::{LessonTotals, Student, ValidationError};
use crate::backend::domain::sync_service::CalendarSyncService;
use crate::backend::storage::{Connection, LessonStorage, StudentStorage};

/// Service for managing students
#[derive(Clone)]
pub struct StudentService<C: Connection> {
    student_repository: C::StudentRepository,
    lesson_repository: C::LessonRepository,
    sync_service: CalendarSyncService<C>,
}

impl<C: Connection> StudentService<C> {
    /// Create a new StudentService
    pub fn new(connection: Arc<C>, sync_service: CalendarSyncService<C>) -> Self {
        let student_repository = connection.create_student_repository();
        let lesson_repository = connection.create_lesson_repository();
        Self {
            student_repository,
            lesson_repository,
            sync_service,
        }
    }

    /// Create a new student
    pub async fn create_student(&self, command: CreateStudentCommand) -> Result<StudentResult> {
        info!("Creating student: name={}", command.name);

        Self::validate_name(&command.name)?;

        let now = Utc::now();
        let student = Student {
            id: Student::generate_id(),
            name: command.name.trim().to_string(),
            first_name: Self::normalize_optional(command.first_name),
            last_name: Self::normalize_optional(command.last_name),
            phone: Self::normalize_optional(command.phone),
            email: Self::normalize_optional(command.email),
            billing_id: Self::normalize_optional(command.billing_id),
            lesson_link: Self::normalize_optional(command.lesson_link),
            created_at: now,
            updated_at: now,
        };

        self.student_repository.store_student(&student).await?;
        info!("Created student: {} with ID: {}", student.display_name(), student.id);

        Ok(StudentResult {
            student,
            success_message: "Student created successfully".to_string(),
        })
    }

    /// Get a student by ID
    pub async fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
        let student = self.student_repository.get_student(student_id).await?;
        if student.is_none() {
            warn!("Student not found: {}", student_id);
        }
        Ok(student)
    }

    /// List all students ordered by display name
    pub async fn list_students(&self) -> Result<StudentListResult> {
        let students = self.student_repository.list_students().await?;
        info!("Found {} students", students.len());
        Ok(StudentListResult { students })
    }

    /// Get a student together with lesson aggregates and history.
    /// The history comes back newest-first for display.
    pub async fn student_detail(&self, student_id: &str) -> Result<StudentDetailResult> {
        let student = self
            .student_repository
            .get_student(student_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Student not found: {}", student_id))?;

        let mut lessons = self
            .lesson_repository
            .list_lessons_for_student(student_id)
            .await?;

        // One snapshot for the whole aggregate
        let now = Local::now().naive_local();
        let totals = LessonTotals::compute(&lessons, now);

        lessons.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));

        Ok(StudentDetailResult {
            student,
            totals,
            lessons,
        })
    }

    /// Update an existing student
    pub async fn update_student(
        &self,
        student_id: &str,
        command: UpdateStudentCommand,
    ) -> Result<StudentResult> {
        info!("Updating student: {}", student_id);

        let mut student = self
            .student_repository
            .get_student(student_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Student not found: {}", student_id))?;

        if let Some(ref name) = command.name {
            Self::validate_name(name)?;
            student.name = name.trim().to_string();
        }

        // An empty string clears the stored value, None leaves it untouched
        if let Some(first_name) = command.first_name {
            student.first_name = Self::normalize_value(first_name);
        }
        if let Some(last_name) = command.last_name {
            student.last_name = Self::normalize_value(last_name);
        }
        if let Some(phone) = command.phone {
            student.phone = Self::normalize_value(phone);
        }
        if let Some(email) = command.email {
            student.email = Self::normalize_value(email);
        }
        if let Some(billing_id) = command.billing_id {
            student.billing_id = Self::normalize_value(billing_id);
        }
        if let Some(lesson_link) = command.lesson_link {
            student.lesson_link = Self::normalize_value(lesson_link);
        }

        student.updated_at = Utc::now();
        self.student_repository.update_student(&student).await?;

        info!("Updated student: {} with ID: {}", student.display_name(), student.id);

        Ok(StudentResult {
            student,
            success_message: "Student updated successfully".to_string(),
        })
    }

    /// Delete a student and their whole lesson history.
    ///
    /// Each synced lesson gets its calendar event reconciled first; a failed
    /// removal is counted and logged but the cascade always runs to the end.
    pub async fn delete_student(&self, student_id: &str) -> Result<DeleteStudentResult> {
        info!("Deleting student: {}", student_id);

        let student = self
            .student_repository
            .get_student(student_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Student not found: {}", student_id))?;

        let lessons = self
            .lesson_repository
            .list_lessons_for_student(student_id)
            .await?;

        // One lesson at a time: the calendar event first, then the record,
        // so a crash mid-cascade leaves at most one lesson half-processed
        let mut removed_calendar_events = 0u32;
        for lesson in &lessons {
            if self.sync_service.on_lesson_deleted(lesson).await {
                removed_calendar_events += 1;
            }
            self.lesson_repository
                .delete_lesson(&lesson.student_id, &lesson.id)
                .await?;
        }

        // Removes the now-empty student directory
        self.student_repository.delete_student(student_id).await?;

        info!(
            "Deleted student {} with {} lessons ({} calendar events removed)",
            student.display_name(),
            lessons.len(),
            removed_calendar_events
        );

        Ok(DeleteStudentResult {
            deleted_lessons: lessons.len() as u32,
            removed_calendar_events,
            success_message: "Student deleted successfully".to_string(),
        })
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyStudentName.into());
        }
        if name.len() > 100 {
            return Err(ValidationError::StudentNameTooLong.into());
        }
        Ok(())
    }

    /// Trim and drop empty optional input
    fn normalize_optional(value: Option<String>) -> Option<String> {
        value.and_then(Self::normalize_value)
    }

    fn normalize_value(value: String) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::models::Lesson;
    use crate::backend::domain::settings_service::SettingsService;
    use crate::backend::events::{EventDraft, EventStore, InMemoryEventStore};
    use crate::backend::storage::csv::CsvConnection;
    use chrono::{Duration, NaiveDate};
    use tempfile::TempDir;

    struct TestStack {
        service: StudentService<CsvConnection>,
        store: Arc<InMemoryEventStore>,
        connection: Arc<CsvConnection>,
        _temp_dir: TempDir,
    }

    fn setup_test() -> TestStack {
        let temp_dir = TempDir::new().unwrap();
        let connection = Arc::new(CsvConnection::new(temp_dir.path()).unwrap());
        let store = Arc::new(InMemoryEventStore::new());
        let sync_service =
            CalendarSyncService::new(store.clone(), SettingsService::new(connection.clone()));
        let service = StudentService::new(connection.clone(), sync_service);

        TestStack {
            service,
            store,
            connection,
            _temp_dir: temp_dir,
        }
    }

    fn create_command(name: &str) -> CreateStudentCommand {
        CreateStudentCommand {
            name: name.to_string(),
            first_name: None,
            last_name: None,
            phone: None,
            email: None,
            billing_id: None,
            lesson_link: None,
        }
    }

    async fn seed_lesson(
        stack: &TestStack,
        student_id: &str,
        date: chrono::NaiveDateTime,
        calendar_event_id: Option<String>,
    ) -> Lesson {
        let lesson = Lesson {
            id: Lesson::generate_id(),
            student_id: student_id.to_string(),
            date,
            duration_hours: 1.0,
            hourly_rate: 60.0,
            paid: false,
            notes: None,
            synced_with_calendar: calendar_event_id.is_some(),
            calendar_event_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        stack
            .connection
            .create_lesson_repository()
            .store_lesson(&lesson)
            .await
            .unwrap();
        lesson
    }

    fn dt(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_student() {
        let stack = setup_test();

        let mut command = create_command("  Anna Nowak  ");
        command.billing_id = Some("A1".to_string());
        command.email = Some("   ".to_string());

        let result = stack.service.create_student(command).await.unwrap();
        assert_eq!(result.student.name, "Anna Nowak");
        assert_eq!(result.student.billing_id.as_deref(), Some("A1"));
        // Whitespace-only input is stored as no value
        assert_eq!(result.student.email, None);
        assert!(result.student.id.starts_with("student::"));
    }

    #[tokio::test]
    async fn test_create_student_validation() {
        let stack = setup_test();

        let result = stack.service.create_student(create_command("   ")).await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .downcast_ref::<ValidationError>()
            .is_some());

        let long_name = "x".repeat(101);
        assert!(stack
            .service
            .create_student(create_command(&long_name))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_update_student_clears_with_empty_string() {
        let stack = setup_test();

        let mut command = create_command("Anna Nowak");
        command.phone = Some("123456789".to_string());
        let created = stack.service.create_student(command).await.unwrap();

        let update = UpdateStudentCommand {
            phone: Some("".to_string()),
            billing_id: Some("A1".to_string()),
            ..Default::default()
        };
        let updated = stack
            .service
            .update_student(&created.student.id, update)
            .await
            .unwrap();

        assert_eq!(updated.student.phone, None);
        assert_eq!(updated.student.billing_id.as_deref(), Some("A1"));
        assert_eq!(updated.student.name, "Anna Nowak");
    }

    #[tokio::test]
    async fn test_student_detail_orders_history_newest_first() {
        let stack = setup_test();
        let created = stack
            .service
            .create_student(create_command("Anna Nowak"))
            .await
            .unwrap();

        seed_lesson(&stack, &created.student.id, dt(2025, 3, 3), None).await;
        seed_lesson(&stack, &created.student.id, dt(2025, 3, 10), None).await;

        let detail = stack.service.student_detail(&created.student.id).await.unwrap();
        assert_eq!(detail.totals.lesson_count, 2);
        assert!(detail.lessons[0].date > detail.lessons[1].date);
    }

    #[tokio::test]
    async fn test_delete_student_cascades_and_counts_events() {
        let stack = setup_test();
        let created = stack
            .service
            .create_student(create_command("Anna Nowak"))
            .await
            .unwrap();
        let student_id = created.student.id.clone();

        // One synced lesson with a live event, two plain ones
        let draft = EventDraft {
            calendar_id: None,
            title: "Lekcja: Anna Nowak".to_string(),
            notes: None,
            url: None,
            start: dt(2025, 3, 3),
            end: dt(2025, 3, 3) + Duration::hours(1),
            reminder_minutes_before: None,
        };
        let event_id = stack.store.create_event(&draft).await.unwrap();

        seed_lesson(&stack, &student_id, dt(2025, 3, 3), Some(event_id)).await;
        seed_lesson(&stack, &student_id, dt(2025, 3, 10), None).await;
        seed_lesson(&stack, &student_id, dt(2025, 3, 17), None).await;

        let result = stack.service.delete_student(&student_id).await.unwrap();
        assert_eq!(result.deleted_lessons, 3);
        assert_eq!(result.removed_calendar_events, 1);
        // Only the synced lesson ever reached the event store
        assert_eq!(stack.store.removal_attempts(), 1);

        assert!(stack.service.get_student(&student_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_student_survives_failed_event_removal() {
        let stack = setup_test();
        let created = stack
            .service
            .create_student(create_command("Anna Nowak"))
            .await
            .unwrap();
        let student_id = created.student.id.clone();

        // The event id points at nothing, so the removal attempt fails
        seed_lesson(&stack, &student_id, dt(2025, 3, 3), Some("event::gone".to_string())).await;
        seed_lesson(&stack, &student_id, dt(2025, 3, 10), None).await;
        seed_lesson(&stack, &student_id, dt(2025, 3, 17), None).await;

        let result = stack.service.delete_student(&student_id).await.unwrap();
        assert_eq!(result.deleted_lessons, 3);
        assert_eq!(result.removed_calendar_events, 0);
        assert_eq!(stack.store.removal_attempts(), 1);
        assert!(stack.service.get_student(&student_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_nonexistent_student() {
        let stack = setup_test();
        let result = stack.service.delete_student("student::missing").await;
        assert!(result.is_err());
    }
}
