//! # Domain Models
//!
//! Core entities of the lesson tracker, independent of storage format and
//! transport shape. REST DTO conversions live in `io::rest::mappers`; these
//! types carry parsed dates and the computed accessors every layer shares.

pub mod lesson;
pub mod settings;
pub mod student;
pub mod validation;

pub use lesson::{Lesson, LessonStatus, LessonTotals, LESSON_DATE_FORMAT};
pub use settings::AppSettings;
pub use student::Student;
pub use validation::ValidationError;
