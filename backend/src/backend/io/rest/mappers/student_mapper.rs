//! backend/src/backend/io/rest/mappers/student_mapper.rs

use chrono::NaiveDateTime;

use crate::backend::domain::commands::students::{
    CreateStudentCommand, DeleteStudentResult, StudentDetailResult, StudentListResult,
    StudentResult, UpdateStudentCommand,
};
use crate::backend::domain::models::student::Student as DomainStudent;
use crate::backend::io::rest::mappers::lesson_mapper::LessonMapper;
use shared::{
    CreateStudentRequest, DeleteStudentResponse, Student as SharedStudent, StudentDetailResponse,
    StudentListResponse, StudentResponse, StudentStats, UpdateStudentRequest,
};

/// Mapper between domain Student models and the shared Student DTOs.
pub struct StudentMapper;

impl StudentMapper {
    /// Converts a domain Student model to a shared Student DTO.
    ///
    /// `display_name` and `initials` are derived fields: they are computed
    /// here so every consumer renders the same header text.
    pub fn to_dto(domain: DomainStudent) -> SharedStudent {
        let display_name = domain.display_name();
        let initials = domain.initials();

        SharedStudent {
            id: domain.id,
            name: domain.name,
            first_name: domain.first_name,
            last_name: domain.last_name,
            phone: domain.phone,
            email: domain.email,
            billing_id: domain.billing_id,
            lesson_link: domain.lesson_link,
            display_name,
            initials,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    /// Converts a shared create request to the domain command.
    pub fn to_create_command(request: CreateStudentRequest) -> CreateStudentCommand {
        CreateStudentCommand {
            name: request.name,
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            email: request.email,
            billing_id: request.billing_id,
            lesson_link: request.lesson_link,
        }
    }

    /// Converts a shared update request to the domain command.
    pub fn to_update_command(request: UpdateStudentRequest) -> UpdateStudentCommand {
        UpdateStudentCommand {
            name: request.name,
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            email: request.email,
            billing_id: request.billing_id,
            lesson_link: request.lesson_link,
        }
    }

    pub fn to_student_response(result: StudentResult) -> StudentResponse {
        StudentResponse {
            student: Self::to_dto(result.student),
            success_message: result.success_message,
        }
    }

    pub fn to_list_response(result: StudentListResult) -> StudentListResponse {
        StudentListResponse {
            students: result.students.into_iter().map(Self::to_dto).collect(),
        }
    }

    /// Builds the detail response; `now` is the snapshot the lesson statuses
    /// in the history are classified against.
    pub fn to_detail_response(result: StudentDetailResult, now: NaiveDateTime) -> StudentDetailResponse {
        StudentDetailResponse {
            student: Self::to_dto(result.student),
            stats: StudentStats {
                lesson_count: result.totals.lesson_count,
                total_hours: result.totals.total_hours,
                total_value: result.totals.total_value,
                total_paid: result.totals.total_paid,
                total_unpaid: result.totals.total_unpaid,
                unpaid_lesson_count: result.totals.unpaid_lesson_count,
                upcoming_lesson_count: result.totals.upcoming_lesson_count,
            },
            lessons: result
                .lessons
                .into_iter()
                .map(|lesson| LessonMapper::to_dto(lesson, now))
                .collect(),
        }
    }

    pub fn to_delete_response(result: DeleteStudentResult) -> DeleteStudentResponse {
        DeleteStudentResponse {
            success_message: result.success_message,
            deleted_lessons: result.deleted_lessons,
            removed_calendar_events: result.removed_calendar_events,
        }
    }
}
