// backend/src/backend/domain/commands.rs

//! Domain-level command and query types
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer is responsible for mapping the
//! public DTOs defined in the `shared` crate to these internal types.

pub mod students {
    use crate::backend::domain::models::{Lesson, LessonTotals, Student};

    /// Input for creating a new student.
    #[derive(Debug, Clone)]
    pub struct CreateStudentCommand {
        pub name: String,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub phone: Option<String>,
        pub email: Option<String>,
        pub billing_id: Option<String>,
        pub lesson_link: Option<String>,
    }

    /// Field-wise student update. None leaves the field untouched; for the
    /// optional fields an empty string clears the stored value.
    #[derive(Debug, Clone, Default)]
    pub struct UpdateStudentCommand {
        pub name: Option<String>,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub phone: Option<String>,
        pub email: Option<String>,
        pub billing_id: Option<String>,
        pub lesson_link: Option<String>,
    }

    /// Result of creating or updating a student.
    #[derive(Debug, Clone)]
    pub struct StudentResult {
        pub student: Student,
        pub success_message: String,
    }

    /// Result of listing students.
    #[derive(Debug, Clone)]
    pub struct StudentListResult {
        pub students: Vec<Student>,
    }

    /// Result of the student detail query: the record, its financial
    /// aggregates and the lesson history newest-first.
    #[derive(Debug, Clone)]
    pub struct StudentDetailResult {
        pub student: Student,
        pub totals: LessonTotals,
        pub lessons: Vec<Lesson>,
    }

    /// Result of the cascading student delete.
    #[derive(Debug, Clone)]
    pub struct DeleteStudentResult {
        pub deleted_lessons: u32,
        pub removed_calendar_events: u32,
        pub success_message: String,
    }
}

pub mod lessons {
    use crate::backend::domain::models::Lesson;

    /// Input for creating a new lesson. The date string is parsed and
    /// validated by the service.
    #[derive(Debug, Clone)]
    pub struct CreateLessonCommand {
        pub student_id: String,
        pub date: String,
        pub duration_hours: f64,
        pub hourly_rate: f64,
        pub paid: Option<bool>,
        pub notes: Option<String>,
        /// Overrides the configured auto-sync default when present.
        pub add_to_calendar: Option<bool>,
    }

    /// Field-wise lesson update. None leaves the field untouched.
    #[derive(Debug, Clone, Default)]
    pub struct UpdateLessonCommand {
        pub student_id: Option<String>,
        pub date: Option<String>,
        pub duration_hours: Option<f64>,
        pub hourly_rate: Option<f64>,
        pub paid: Option<bool>,
        pub notes: Option<String>,
    }

    /// Query parameters for listing lessons.
    #[derive(Debug, Clone, Default)]
    pub struct LessonListQuery {
        pub student_id: Option<String>,
        pub year: Option<i32>,
        pub month: Option<u32>,
    }

    /// Result of creating, updating or toggling a lesson.
    #[derive(Debug, Clone)]
    pub struct LessonResult {
        pub lesson: Lesson,
        pub success_message: String,
    }

    /// Result of listing lessons.
    #[derive(Debug, Clone)]
    pub struct LessonListResult {
        pub lessons: Vec<Lesson>,
    }

    /// Result of deleting a lesson.
    #[derive(Debug, Clone)]
    pub struct DeleteLessonResult {
        pub removed_calendar_event: bool,
        pub success_message: String,
    }

    /// Result of a manual sync or unsync request.
    #[derive(Debug, Clone)]
    pub struct SyncLessonResult {
        pub lesson: Lesson,
        pub synced: bool,
        pub success_message: String,
    }
}

pub mod reports {
    /// Query for one calendar month of billing data.
    #[derive(Debug, Clone)]
    pub struct MonthlyReportQuery {
        pub year: i32,
        pub month: u32,
    }

    /// Input for exporting a monthly report to disk.
    #[derive(Debug, Clone)]
    pub struct ExportReportCommand {
        pub year: i32,
        pub month: u32,
        /// Open the file with the host default application after writing.
        pub open_after_export: bool,
    }
}
