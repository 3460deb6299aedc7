//! Validation failures raised before anything touches the store.

/// Rejected-input taxonomy. Services return these wrapped in `anyhow::Error`
/// so the REST layer can downcast and answer 400 instead of 500.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Student name cannot be empty")]
    EmptyStudentName,
    #[error("Student name cannot exceed 100 characters")]
    StudentNameTooLong,
    #[error("Unknown student: {0}")]
    UnknownStudent(String),
    #[error("Lesson duration must be positive, got {0}")]
    NonPositiveDuration(f64),
    #[error("Hourly rate cannot be negative, got {0}")]
    NegativeHourlyRate(f64),
    #[error("Invalid lesson date '{0}', expected YYYY-MM-DDTHH:MM:SS")]
    InvalidLessonDate(String),
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),
}
