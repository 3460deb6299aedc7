//! backend/src/backend/io/rest/mappers/lesson_mapper.rs

use chrono::NaiveDateTime;

use crate::backend::domain::commands::lessons::{
    CreateLessonCommand, DeleteLessonResult, LessonListResult, LessonResult, SyncLessonResult,
    UpdateLessonCommand,
};
use crate::backend::domain::models::lesson::{
    Lesson as DomainLesson, LessonStatus as DomainLessonStatus, LESSON_DATE_FORMAT,
};
use shared::{
    CreateLessonRequest, DeleteLessonResponse, Lesson as SharedLesson, LessonListResponse,
    LessonResponse, LessonStatus as SharedLessonStatus, SyncLessonResponse, UpdateLessonRequest,
};

/// Mapper between domain Lesson models and the shared Lesson DTOs.
///
/// The DTO carries three derived fields the domain model computes on demand
/// (`end_date`, `total_value`, `status`); `to_dto` takes the classification
/// snapshot as a parameter so one `now` covers a whole batch.
pub struct LessonMapper;

impl LessonMapper {
    /// Converts a domain Lesson model to a shared Lesson DTO, classifying
    /// its status against `now`.
    pub fn to_dto(domain: DomainLesson, now: NaiveDateTime) -> SharedLesson {
        let end_date = domain.end_date().format(LESSON_DATE_FORMAT).to_string();
        let total_value = domain.total_value();
        let status = Self::to_dto_status(domain.status(now));

        SharedLesson {
            id: domain.id,
            student_id: domain.student_id,
            date: domain.date.format(LESSON_DATE_FORMAT).to_string(),
            end_date,
            duration_hours: domain.duration_hours,
            hourly_rate: domain.hourly_rate,
            paid: domain.paid,
            notes: domain.notes,
            calendar_event_id: domain.calendar_event_id,
            synced_with_calendar: domain.synced_with_calendar,
            total_value,
            status,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    /// Converts a shared create request to the domain command.
    pub fn to_create_command(request: CreateLessonRequest) -> CreateLessonCommand {
        CreateLessonCommand {
            student_id: request.student_id,
            date: request.date,
            duration_hours: request.duration_hours,
            hourly_rate: request.hourly_rate,
            paid: request.paid,
            notes: request.notes,
            add_to_calendar: request.add_to_calendar,
        }
    }

    /// Converts a shared update request to the domain command.
    pub fn to_update_command(request: UpdateLessonRequest) -> UpdateLessonCommand {
        UpdateLessonCommand {
            student_id: request.student_id,
            date: request.date,
            duration_hours: request.duration_hours,
            hourly_rate: request.hourly_rate,
            paid: request.paid,
            notes: request.notes,
        }
    }

    pub fn to_lesson_response(result: LessonResult, now: NaiveDateTime) -> LessonResponse {
        LessonResponse {
            lesson: Self::to_dto(result.lesson, now),
            success_message: result.success_message,
        }
    }

    pub fn to_list_response(result: LessonListResult, now: NaiveDateTime) -> LessonListResponse {
        LessonListResponse {
            lessons: result
                .lessons
                .into_iter()
                .map(|lesson| Self::to_dto(lesson, now))
                .collect(),
        }
    }

    pub fn to_delete_response(result: DeleteLessonResult) -> DeleteLessonResponse {
        DeleteLessonResponse {
            success_message: result.success_message,
            removed_calendar_event: result.removed_calendar_event,
        }
    }

    pub fn to_sync_response(result: SyncLessonResult, now: NaiveDateTime) -> SyncLessonResponse {
        SyncLessonResponse {
            lesson: Self::to_dto(result.lesson, now),
            synced: result.synced,
            success_message: result.success_message,
        }
    }

    fn to_dto_status(domain_status: DomainLessonStatus) -> SharedLessonStatus {
        match domain_status {
            DomainLessonStatus::Upcoming => SharedLessonStatus::Upcoming,
            DomainLessonStatus::Completed => SharedLessonStatus::Completed,
            DomainLessonStatus::Unpaid => SharedLessonStatus::Unpaid,
        }
    }
}
