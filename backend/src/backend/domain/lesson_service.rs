//! Lesson management domain logic.
//!
//! Owns the lesson lifecycle: validation, persistence, payment toggling and
//! the calendar hooks around every write. The calendar is strictly
//! best-effort here; a lesson write never fails because the event store
//! refused, and the sync outcome is recorded on the lesson itself.
//!
//! Lesson dates are local wall-clock strings ("YYYY-MM-DDTHH:MM:SS") at the
//! boundary and `NaiveDateTime` inside. A lesson exactly at the current
//! instant still counts as upcoming.

use anyhow::Result;
use chrono::{Datelike, NaiveDateTime, Utc};
use log::{info, warn};
use std::sync::Arc;

use crate::backend::domain::commands::lessons::{
    CreateLessonCommand, DeleteLessonResult, LessonListQuery, LessonListResult, LessonResult,
    SyncLessonResult, UpdateLessonCommand,
};
use crate::backend::domain::models::{Lesson, Student, ValidationError, LESSON_DATE_FORMAT};
use crate::backend::domain::settings_service::SettingsService;
use crate::backend::domain::sync_service::CalendarSyncService;
use crate::backend::storage::{Connection, LessonStorage, StudentStorage};

/// Service for managing lessons
#[derive(Clone)]
pub struct LessonService<C: Connection> {
    lesson_repository: C::LessonRepository,
    student_repository: C::StudentRepository,
    sync_service: CalendarSyncService<C>,
    settings_service: SettingsService<C>,
}

impl<C: Connection> LessonService<C> {
    /// Create a new LessonService
    pub fn new(
        connection: Arc<C>,
        sync_service: CalendarSyncService<C>,
        settings_service: SettingsService<C>,
    ) -> Self {
        let lesson_repository = connection.create_lesson_repository();
        let student_repository = connection.create_student_repository();
        Self {
            lesson_repository,
            student_repository,
            sync_service,
            settings_service,
        }
    }

    /// Create a new lesson, syncing it into the calendar when configured
    pub async fn create_lesson(&self, command: CreateLessonCommand) -> Result<LessonResult> {
        info!(
            "Creating lesson: student={}, date={}",
            command.student_id, command.date
        );

        let student = self
            .student_repository
            .get_student(&command.student_id)
            .await?
            .ok_or_else(|| ValidationError::UnknownStudent(command.student_id.clone()))?;

        let date = Self::parse_date(&command.date)?;
        Self::validate_numbers(command.duration_hours, command.hourly_rate)?;

        let now = Utc::now();
        let mut lesson = Lesson {
            id: Lesson::generate_id(),
            student_id: student.id.clone(),
            date,
            duration_hours: command.duration_hours,
            hourly_rate: command.hourly_rate,
            paid: command.paid.unwrap_or(false),
            notes: command.notes.and_then(Self::normalize_value),
            calendar_event_id: None,
            synced_with_calendar: false,
            created_at: now,
            updated_at: now,
        };

        // The request override wins over the configured default
        let auto_sync = match self.settings_service.get_settings().await {
            Ok(settings) => settings.auto_sync_on_create,
            Err(e) => {
                warn!("Could not read settings, assuming auto-sync: {}", e);
                true
            }
        };
        let should_sync = command.add_to_calendar.unwrap_or(auto_sync);

        if should_sync {
            if let Some(event_id) = self.sync_service.on_lesson_created(&student, &lesson).await {
                lesson.calendar_event_id = Some(event_id);
                lesson.synced_with_calendar = true;
            }
        }

        self.lesson_repository.store_lesson(&lesson).await?;

        let success_message = if lesson.synced_with_calendar {
            "Lesson created and added to calendar".to_string()
        } else {
            "Lesson created successfully".to_string()
        };

        Ok(LessonResult {
            lesson,
            success_message,
        })
    }

    /// Get a lesson by ID
    pub async fn get_lesson(&self, lesson_id: &str) -> Result<Option<Lesson>> {
        self.lesson_repository.get_lesson(lesson_id).await
    }

    /// List lessons, optionally narrowed by student and calendar month
    pub async fn list_lessons(&self, query: LessonListQuery) -> Result<LessonListResult> {
        let mut lessons = match (&query.student_id, query.year, query.month) {
            (Some(student_id), None, None) => {
                self.lesson_repository
                    .list_lessons_for_student(student_id)
                    .await?
            }
            (_, Some(year), Some(month)) => {
                if !(1..=12).contains(&month) {
                    return Err(ValidationError::InvalidMonth(month).into());
                }
                self.lesson_repository
                    .list_lessons_in_month(year, month)
                    .await?
            }
            _ => self.lesson_repository.list_all_lessons().await?,
        };

        if query.month.is_some() || query.year.is_some() {
            if let Some(student_id) = &query.student_id {
                lessons.retain(|l| &l.student_id == student_id);
            }
        }
        if let (Some(year), None) = (query.year, query.month) {
            lessons.retain(|l| l.date.year() == year);
        }

        Ok(LessonListResult { lessons })
    }

    /// Update an existing lesson.
    ///
    /// Reassignment to another student moves the record between lesson
    /// files. A lesson that is synced gets its calendar event reconciled
    /// against the edited state before anything is persisted; when both the
    /// rewrite and the fallback creation fail, the lesson is marked unsynced
    /// and the stale event id is kept for diagnostics.
    pub async fn update_lesson(
        &self,
        lesson_id: &str,
        command: UpdateLessonCommand,
    ) -> Result<LessonResult> {
        info!("Updating lesson: {}", lesson_id);

        let mut lesson = self
            .lesson_repository
            .get_lesson(lesson_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Lesson not found: {}", lesson_id))?;
        let previous_student_id = lesson.student_id.clone();

        if let Some(student_id) = command.student_id {
            self.student_repository
                .get_student(&student_id)
                .await?
                .ok_or_else(|| ValidationError::UnknownStudent(student_id.clone()))?;
            lesson.student_id = student_id;
        }
        if let Some(ref date) = command.date {
            lesson.date = Self::parse_date(date)?;
        }
        if let Some(duration_hours) = command.duration_hours {
            lesson.duration_hours = duration_hours;
        }
        if let Some(hourly_rate) = command.hourly_rate {
            lesson.hourly_rate = hourly_rate;
        }
        Self::validate_numbers(lesson.duration_hours, lesson.hourly_rate)?;
        if let Some(paid) = command.paid {
            lesson.paid = paid;
        }
        if let Some(notes) = command.notes {
            lesson.notes = Self::normalize_value(notes);
        }

        // Reconcile the event against the edited state before persisting
        if lesson.synced_with_calendar {
            let student = self.owning_student(&lesson).await?;
            match self.sync_service.on_lesson_updated(&student, &lesson).await {
                Some(event_id) => lesson.calendar_event_id = Some(event_id),
                None => {
                    warn!(
                        "Lesson {} lost its calendar event and recreation failed",
                        lesson.id
                    );
                    lesson.synced_with_calendar = false;
                }
            }
        }

        lesson.updated_at = Utc::now();

        if lesson.student_id == previous_student_id {
            self.lesson_repository.update_lesson(&lesson).await?;
        } else {
            // Reassignment moves the record into the new student's file
            self.lesson_repository
                .delete_lesson(&previous_student_id, &lesson.id)
                .await?;
            self.lesson_repository.store_lesson(&lesson).await?;
            info!(
                "Moved lesson {} from {} to {}",
                lesson.id, previous_student_id, lesson.student_id
            );
        }

        Ok(LessonResult {
            lesson,
            success_message: "Lesson updated successfully".to_string(),
        })
    }

    /// Flip the paid flag of a lesson
    pub async fn toggle_paid(&self, lesson_id: &str) -> Result<LessonResult> {
        let mut lesson = self
            .lesson_repository
            .get_lesson(lesson_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Lesson not found: {}", lesson_id))?;

        lesson.paid = !lesson.paid;
        lesson.updated_at = Utc::now();
        self.lesson_repository.update_lesson(&lesson).await?;

        let success_message = if lesson.paid {
            "Lesson marked as paid".to_string()
        } else {
            "Lesson marked as unpaid".to_string()
        };
        info!("Toggled paid flag of lesson {}: paid={}", lesson.id, lesson.paid);

        Ok(LessonResult {
            lesson,
            success_message,
        })
    }

    /// Delete a lesson, removing its calendar event when it has one
    pub async fn delete_lesson(&self, lesson_id: &str) -> Result<DeleteLessonResult> {
        info!("Deleting lesson: {}", lesson_id);

        let lesson = self
            .lesson_repository
            .get_lesson(lesson_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Lesson not found: {}", lesson_id))?;

        let removed_calendar_event = self.sync_service.on_lesson_deleted(&lesson).await;

        let deleted = self
            .lesson_repository
            .delete_lesson(&lesson.student_id, &lesson.id)
            .await?;
        if !deleted {
            warn!("Lesson {} was already gone while deleting", lesson.id);
        }

        Ok(DeleteLessonResult {
            removed_calendar_event,
            success_message: "Lesson deleted successfully".to_string(),
        })
    }

    /// Sync one lesson into the calendar on explicit request
    pub async fn sync_lesson(&self, lesson_id: &str) -> Result<SyncLessonResult> {
        let mut lesson = self
            .lesson_repository
            .get_lesson(lesson_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Lesson not found: {}", lesson_id))?;
        let student = self.owning_student(&lesson).await?;

        match self.sync_service.sync_now(&student, &lesson).await {
            Some(event_id) => {
                lesson.calendar_event_id = Some(event_id);
                lesson.synced_with_calendar = true;
                lesson.updated_at = Utc::now();
                self.lesson_repository.update_lesson(&lesson).await?;

                Ok(SyncLessonResult {
                    lesson,
                    synced: true,
                    success_message: "Lesson synced with calendar".to_string(),
                })
            }
            None => {
                if lesson.synced_with_calendar {
                    // The event is gone and could not be recreated
                    lesson.synced_with_calendar = false;
                    lesson.updated_at = Utc::now();
                    self.lesson_repository.update_lesson(&lesson).await?;
                }

                Ok(SyncLessonResult {
                    lesson,
                    synced: false,
                    success_message: "Calendar sync failed".to_string(),
                })
            }
        }
    }

    /// Detach one lesson from the calendar on explicit request.
    /// The event id survives a failed removal for diagnostics.
    pub async fn unsync_lesson(&self, lesson_id: &str) -> Result<SyncLessonResult> {
        let mut lesson = self
            .lesson_repository
            .get_lesson(lesson_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Lesson not found: {}", lesson_id))?;

        if lesson.calendar_event_id.is_none() && !lesson.synced_with_calendar {
            return Ok(SyncLessonResult {
                lesson,
                synced: false,
                success_message: "Lesson is not synced with the calendar".to_string(),
            });
        }

        let removed = self.sync_service.unsync(&lesson).await;
        if removed {
            lesson.calendar_event_id = None;
        }
        lesson.synced_with_calendar = false;
        lesson.updated_at = Utc::now();
        self.lesson_repository.update_lesson(&lesson).await?;

        let success_message = if removed {
            "Lesson removed from calendar".to_string()
        } else {
            "Lesson unsynced, but the calendar event could not be removed".to_string()
        };

        Ok(SyncLessonResult {
            lesson,
            synced: false,
            success_message,
        })
    }

    async fn owning_student(&self, lesson: &Lesson) -> Result<Student> {
        self.student_repository
            .get_student(&lesson.student_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Student not found: {}", lesson.student_id))
    }

    fn parse_date(date: &str) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(date, LESSON_DATE_FORMAT)
            .map_err(|_| ValidationError::InvalidLessonDate(date.to_string()).into())
    }

    fn validate_numbers(duration_hours: f64, hourly_rate: f64) -> Result<()> {
        if !duration_hours.is_finite() || duration_hours <= 0.0 {
            return Err(ValidationError::NonPositiveDuration(duration_hours).into());
        }
        if !hourly_rate.is_finite() || hourly_rate < 0.0 {
            return Err(ValidationError::NegativeHourlyRate(hourly_rate).into());
        }
        Ok(())
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
