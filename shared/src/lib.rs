use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Student ID in format: "student::<uuid-v4>"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    /// Required display name, never empty
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Students sharing a billing ID are invoiced together
    pub billing_id: Option<String>,
    /// Video call URL reused for every lesson of this student
    pub lesson_link: Option<String>,
    /// Preferred name for headers and sorting (first + last, else name)
    pub display_name: String,
    /// One or two characters for avatar badges
    pub initials: String,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

/// Request for creating a new student
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateStudentRequest {
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub billing_id: Option<String>,
    pub lesson_link: Option<String>,
}

/// Request for updating an existing student. Omitted fields are left as-is;
/// an empty string clears the optional field it targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub billing_id: Option<String>,
    pub lesson_link: Option<String>,
}

/// Response after creating or updating a student
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentResponse {
    pub student: Student,
    pub success_message: String,
}

/// Response containing a list of students
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentListResponse {
    pub students: Vec<Student>,
}

/// Per-student financial aggregates computed over the owned lessons
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentStats {
    pub lesson_count: usize,
    pub total_hours: f64,
    pub total_value: f64,
    pub total_paid: f64,
    pub total_unpaid: f64,
    pub unpaid_lesson_count: usize,
    pub upcoming_lesson_count: usize,
}

/// Response for a single student with aggregates and lesson history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentDetailResponse {
    pub student: Student,
    pub stats: StudentStats,
    /// Owned lessons, newest first
    pub lessons: Vec<Lesson>,
}

/// Response after deleting a student and its lessons
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteStudentResponse {
    pub success_message: String,
    pub deleted_lessons: u32,
    pub removed_calendar_events: u32,
}

/// Lesson ID in format: "lesson::<uuid-v4>"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    /// ID of the student this lesson belongs to
    pub student_id: String,
    /// Start instant, local wall clock ("YYYY-MM-DDTHH:MM:SS")
    pub date: String,
    /// End instant derived from date + duration ("YYYY-MM-DDTHH:MM:SS")
    pub end_date: String,
    /// Length in hours, fractions allowed
    pub duration_hours: f64,
    /// Rate in PLN per hour
    pub hourly_rate: f64,
    pub paid: bool,
    pub notes: Option<String>,
    /// Identifier of the linked external calendar event, if any
    pub calendar_event_id: Option<String>,
    pub synced_with_calendar: bool,
    /// duration_hours * hourly_rate
    pub total_value: f64,
    /// Classification at response time
    pub status: LessonStatus,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

/// Three-way lesson classification for rendering and billing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonStatus {
    /// Start instant has not passed yet
    Upcoming,
    /// Past and paid for
    Completed,
    /// Past and still awaiting payment
    Unpaid,
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LessonStatus::Upcoming => write!(f, "upcoming"),
            LessonStatus::Completed => write!(f, "completed"),
            LessonStatus::Unpaid => write!(f, "unpaid"),
        }
    }
}

/// Request for creating a new lesson
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateLessonRequest {
    pub student_id: String,
    /// Start instant, local wall clock ("YYYY-MM-DDTHH:MM:SS")
    pub date: String,
    pub duration_hours: f64,
    pub hourly_rate: f64,
    /// Defaults to false when omitted
    pub paid: Option<bool>,
    pub notes: Option<String>,
    /// Overrides the configured auto-sync default when present
    pub add_to_calendar: Option<bool>,
}

/// Request for updating an existing lesson. Omitted fields are left as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateLessonRequest {
    pub student_id: Option<String>,
    pub date: Option<String>,
    pub duration_hours: Option<f64>,
    pub hourly_rate: Option<f64>,
    pub paid: Option<bool>,
    pub notes: Option<String>,
}

/// Response after creating or updating a lesson
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LessonResponse {
    pub lesson: Lesson,
    pub success_message: String,
}

/// Response containing a list of lessons
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LessonListResponse {
    pub lessons: Vec<Lesson>,
}

/// Response after deleting a lesson
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteLessonResponse {
    pub success_message: String,
    /// Whether the linked calendar event was removed as part of the delete
    pub removed_calendar_event: bool,
}

/// Response after a manual sync or unsync request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncLessonResponse {
    pub lesson: Lesson,
    /// Whether the requested calendar operation succeeded
    pub synced: bool,
    pub success_message: String,
}

/// Type of calendar grid cell for explicit rendering logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarDayType {
    /// Day of the previous month filling the first week row
    LeadingDay,
    /// Actual day within the month
    MonthDay,
    /// Day of the next month filling the last week row
    TrailingDay,
}

/// A single cell of a month or week grid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarDay {
    /// ISO date of this cell ("YYYY-MM-DD"); real for padding cells too
    pub date: String,
    /// Day-of-month number of `date`
    pub day: u32,
    pub day_type: CalendarDayType,
    pub lessons: Vec<Lesson>,
}

/// A month grid with lessons bucketed onto its days
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarMonth {
    pub month: u32,
    pub year: u32,
    /// Whole 7-day rows; leading/trailing cells carry adjacent-month dates
    pub days: Vec<CalendarDay>,
    /// Grid column (0-6) of the first day of the month
    pub first_day_of_week: u32,
}

/// The 7 days of a single week with lessons bucketed onto them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarWeek {
    /// ISO date of the first (week-start) day
    pub start_date: String,
    pub days: Vec<CalendarDay>,
}

/// One hour slot of a day schedule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayScheduleHour {
    /// Hour of day (24h clock)
    pub hour: u32,
    /// Rendered label, e.g. "08:00"
    pub label: String,
    pub lessons: Vec<Lesson>,
}

/// Working-hours view of a single day (08:00 through 22:00)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarDaySchedule {
    /// ISO date ("YYYY-MM-DD")
    pub date: String,
    pub hours: Vec<DayScheduleHour>,
}

/// Represents the current focus date for calendar navigation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarFocusDate {
    pub month: u32,
    pub year: u32,
}

impl Default for CalendarFocusDate {
    fn default() -> Self {
        let now = chrono::Local::now();
        Self {
            month: now.month(),
            year: now.year() as u32,
        }
    }
}

/// Request for moving the calendar focus to a specific month
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetCalendarFocusRequest {
    pub month: u32,
    pub year: u32,
}

/// Response carrying the calendar focus after a read or navigation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarFocusResponse {
    pub focus_date: CalendarFocusDate,
    pub success_message: String,
}

/// Current date information from the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentDateResponse {
    pub month: u32,
    pub year: u32,
    pub day: u32,
    pub formatted_date: String, // e.g., "June 19, 2025"
    pub iso_date: String,       // e.g., "2025-06-19"
}

/// An external calendar the tutor can file lesson events into
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarInfo {
    pub id: String,
    pub title: String,
    pub is_default: bool,
}

/// Response listing the writable external calendars
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarListResponse {
    pub calendars: Vec<CalendarInfo>,
    pub authorized: bool,
}

/// Request for selecting the calendar lesson events are filed into
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetDefaultCalendarRequest {
    pub calendar_id: String,
}

/// Response after selecting the default calendar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetDefaultCalendarResponse {
    pub default_calendar_id: String,
    pub success_message: String,
}

/// Response reporting the cached calendar authorization state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarAuthorizationResponse {
    pub authorized: bool,
}

/// A lesson event found in the external calendar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpcomingEvent {
    pub event_id: String,
    pub calendar_id: String,
    pub title: String,
    /// Start instant, local wall clock ("YYYY-MM-DDTHH:MM:SS")
    pub start: String,
    /// End instant, local wall clock ("YYYY-MM-DDTHH:MM:SS")
    pub end: String,
}

/// Response listing upcoming lesson events from the external calendar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpcomingEventsResponse {
    pub events: Vec<UpcomingEvent>,
    /// Days ahead the query covered
    pub days_ahead: i64,
}

/// One billed lesson line of a monthly report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRow {
    /// Lesson start ("YYYY-MM-DD HH:MM")
    pub date: String,
    pub duration_hours: f64,
    pub hourly_rate: f64,
    pub amount: f64,
    pub paid: bool,
    /// Payment label as printed on the report ("Opłacone"/"Nieopłacone")
    pub status_label: String,
}

/// Lessons of one student inside a billing group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentReportSection {
    pub student_id: String,
    pub student_name: String,
    pub rows: Vec<ReportRow>,
    pub total_hours: f64,
    pub total_amount: f64,
}

/// All students billed under one billing ID
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingGroup {
    /// billing_id of the member students, or display name when absent
    pub billing_key: String,
    pub students: Vec<StudentReportSection>,
    pub total_hours: f64,
    pub total_amount: f64,
}

/// Aggregated monthly billing report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyReport {
    pub month: u32,
    pub year: u32,
    /// Polish month header, e.g. "Marzec 2025"
    pub month_label: String,
    pub groups: Vec<BillingGroup>,
    pub total_hours: f64,
    pub total_amount: f64,
}

/// Response carrying a monthly report and its CSV rendering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyReportResponse {
    pub report: MonthlyReport,
    /// Semicolon-delimited rendering, byte-stable for identical input
    pub csv_content: String,
    /// Suggested file name, e.g. "Raport_2025_3.csv"
    pub filename: String,
}

/// Request for exporting a monthly report to disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportReportRequest {
    pub month: u32,
    pub year: u32,
    /// Open the file with the host default application after writing
    pub open_after_export: Option<bool>,
}

/// Response after exporting a monthly report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportReportResponse {
    pub success: bool,
    pub message: String,
    pub file_path: Option<String>,
    pub filename: String,
}

/// Process-wide preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Calendar lesson events are filed into; None until one is picked
    pub default_calendar_id: Option<String>,
    /// Whether freshly created lessons are synced without being asked
    pub auto_sync_on_create: bool,
}

/// Request for updating preferences. Omitted fields are left as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateSettingsRequest {
    pub default_calendar_id: Option<String>,
    pub auto_sync_on_create: Option<bool>,
}

/// Response after reading or updating preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettingsResponse {
    pub settings: Settings,
    pub success_message: String,
}

impl Student {
    /// Parse a student ID and extract the UUID part
    pub fn parse_id(id: &str) -> Result<uuid::Uuid, EntityIdError> {
        parse_prefixed_id(id, "student")
    }
}

impl Lesson {
    /// Parse a lesson ID and extract the UUID part
    pub fn parse_id(id: &str) -> Result<uuid::Uuid, EntityIdError> {
        parse_prefixed_id(id, "lesson")
    }
}

fn parse_prefixed_id(id: &str, prefix: &str) -> Result<uuid::Uuid, EntityIdError> {
    let parts: Vec<&str> = id.split("::").collect();
    if parts.len() != 2 || parts[0] != prefix {
        return Err(EntityIdError::InvalidFormat);
    }
    uuid::Uuid::parse_str(parts[1]).map_err(|_| EntityIdError::InvalidUuid)
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityIdError {
    InvalidFormat,
    InvalidUuid,
}

impl fmt::Display for EntityIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityIdError::InvalidFormat => write!(f, "Invalid entity ID format"),
            EntityIdError::InvalidUuid => write!(f, "Invalid UUID in entity ID"),
        }
    }
}

impl std::error::Error for EntityIdError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_student_id() {
        let id = format!("student::{}", uuid::Uuid::new_v4());
        assert!(Student::parse_id(&id).is_ok());

        // Wrong prefix
        let lesson_id = format!("lesson::{}", uuid::Uuid::new_v4());
        assert_eq!(
            Student::parse_id(&lesson_id),
            Err(EntityIdError::InvalidFormat)
        );

        // Not a UUID
        assert_eq!(
            Student::parse_id("student::not-a-uuid"),
            Err(EntityIdError::InvalidUuid)
        );

        // No separator
        assert_eq!(Student::parse_id("student"), Err(EntityIdError::InvalidFormat));
    }

    #[test]
    fn test_parse_lesson_id() {
        let id = format!("lesson::{}", uuid::Uuid::new_v4());
        assert!(Lesson::parse_id(&id).is_ok());

        assert_eq!(
            Lesson::parse_id("lesson::123::456"),
            Err(EntityIdError::InvalidFormat)
        );
    }

    #[test]
    fn test_lesson_status_display() {
        assert_eq!(LessonStatus::Upcoming.to_string(), "upcoming");
        assert_eq!(LessonStatus::Completed.to_string(), "completed");
        assert_eq!(LessonStatus::Unpaid.to_string(), "unpaid");
    }

    #[test]
    fn test_calendar_focus_date_default_is_valid() {
        let focus = CalendarFocusDate::default();
        assert!((1..=12).contains(&focus.month));
        assert!(focus.year >= 2024);
    }
}
