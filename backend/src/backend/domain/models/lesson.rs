//! Lesson domain model.
//!
//! A lesson is one scheduled block of tutoring: a start instant on the local
//! wall clock, a duration in hours and a rate in PLN. Payment state and the
//! link to an external calendar event travel with the record; the three-way
//! status is never stored and is recomputed against a caller-supplied "now"
//! so one snapshot classifies a whole batch consistently.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wall-clock format lesson start instants travel in, on the wire and in
/// the lesson files ("YYYY-MM-DDTHH:MM:SS")
pub const LESSON_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Three-way lesson classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonStatus {
    /// Start instant has not passed yet, paid or not
    Upcoming,
    /// Past and paid for
    Completed,
    /// Past and still awaiting payment
    Unpaid,
}

/// Core lesson entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique identifier ("lesson::<uuid-v4>")
    pub id: String,
    /// Owning student, required
    pub student_id: String,
    /// Start instant, local wall clock
    pub date: NaiveDateTime,
    /// Length in hours, fractions allowed, always positive
    pub duration_hours: f64,
    /// Rate in PLN per hour, never negative
    pub hourly_rate: f64,
    pub paid: bool,
    pub notes: Option<String>,
    /// Identifier of the linked external calendar event.
    /// `synced_with_calendar` implies this is `Some`; the converse does not
    /// hold (a stale id may survive a failed unsync for diagnostics).
    pub calendar_event_id: Option<String>,
    pub synced_with_calendar: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lesson {
    /// Generate a new lesson ID
    pub fn generate_id() -> String {
        format!("lesson::{}", Uuid::new_v4())
    }

    /// Billable amount for this lesson
    pub fn total_value(&self) -> f64 {
        self.duration_hours * self.hourly_rate
    }

    /// End instant derived from start + duration, fractional hours respected
    pub fn end_date(&self) -> NaiveDateTime {
        self.date + Duration::seconds((self.duration_hours * 3600.0).round() as i64)
    }

    /// Classify this lesson against the given snapshot
    pub fn status(&self, now: NaiveDateTime) -> LessonStatus {
        if self.date >= now {
            LessonStatus::Upcoming
        } else if self.paid {
            LessonStatus::Completed
        } else {
            LessonStatus::Unpaid
        }
    }

    /// Classify a batch of lessons with a single snapshot
    pub fn classify_all(lessons: &[Lesson], now: NaiveDateTime) -> Vec<LessonStatus> {
        lessons.iter().map(|lesson| lesson.status(now)).collect()
    }
}

/// Financial aggregates over a slice of lessons, computed with one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct LessonTotals {
    pub lesson_count: usize,
    pub total_hours: f64,
    pub total_value: f64,
    pub total_paid: f64,
    pub total_unpaid: f64,
    pub unpaid_lesson_count: usize,
    pub upcoming_lesson_count: usize,
}

impl LessonTotals {
    pub fn compute(lessons: &[Lesson], now: NaiveDateTime) -> Self {
        let mut totals = LessonTotals {
            lesson_count: lessons.len(),
            total_hours: 0.0,
            total_value: 0.0,
            total_paid: 0.0,
            total_unpaid: 0.0,
            unpaid_lesson_count: 0,
            upcoming_lesson_count: 0,
        };

        for lesson in lessons {
            let value = lesson.total_value();
            totals.total_hours += lesson.duration_hours;
            totals.total_value += value;
            if lesson.paid {
                totals.total_paid += value;
            } else {
                totals.unpaid_lesson_count += 1;
            }
            if lesson.date >= now {
                totals.upcoming_lesson_count += 1;
            }
        }

        totals.total_unpaid = totals.total_value - totals.total_paid;
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn lesson_at(date: NaiveDateTime, duration: f64, rate: f64, paid: bool) -> Lesson {
        Lesson {
            id: Lesson::generate_id(),
            student_id: "student::test".to_string(),
            date,
            duration_hours: duration,
            hourly_rate: rate,
            paid,
            notes: None,
            calendar_event_id: None,
            synced_with_calendar: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_total_value() {
        let lesson = lesson_at(dt(2025, 3, 3, 10, 0), 1.5, 60.0, false);
        assert!((lesson.total_value() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_end_date_fractional_hours() {
        let lesson = lesson_at(dt(2025, 3, 3, 10, 0), 1.5, 60.0, false);
        assert_eq!(lesson.end_date(), dt(2025, 3, 3, 11, 30));
    }

    #[test]
    fn test_status_upcoming_regardless_of_paid() {
        let now = dt(2025, 3, 10, 12, 0);
        let future_unpaid = lesson_at(dt(2025, 3, 11, 12, 0), 1.0, 60.0, false);
        let future_paid = lesson_at(dt(2025, 3, 11, 12, 0), 1.0, 60.0, true);
        assert_eq!(future_unpaid.status(now), LessonStatus::Upcoming);
        assert_eq!(future_paid.status(now), LessonStatus::Upcoming);
    }

    #[test]
    fn test_status_boundary_is_upcoming() {
        // date == now counts as not yet started
        let now = dt(2025, 3, 10, 12, 0);
        let lesson = lesson_at(now, 1.0, 60.0, false);
        assert_eq!(lesson.status(now), LessonStatus::Upcoming);
    }

    #[test]
    fn test_status_past_lessons() {
        let now = dt(2025, 3, 10, 12, 0);
        let past_paid = lesson_at(dt(2025, 3, 9, 12, 0), 1.0, 60.0, true);
        let past_unpaid = lesson_at(dt(2025, 3, 9, 12, 0), 1.0, 60.0, false);
        assert_eq!(past_paid.status(now), LessonStatus::Completed);
        assert_eq!(past_unpaid.status(now), LessonStatus::Unpaid);
    }

    #[test]
    fn test_classify_all_uses_one_snapshot() {
        let now = dt(2025, 3, 10, 12, 0);
        let lessons = vec![
            lesson_at(dt(2025, 3, 9, 12, 0), 1.0, 60.0, true),
            lesson_at(dt(2025, 3, 9, 12, 0), 1.0, 60.0, false),
            lesson_at(dt(2025, 3, 11, 12, 0), 1.0, 60.0, false),
        ];
        let statuses = Lesson::classify_all(&lessons, now);
        assert_eq!(
            statuses,
            vec![
                LessonStatus::Completed,
                LessonStatus::Unpaid,
                LessonStatus::Upcoming,
            ]
        );
    }

    #[test]
    fn test_totals_identity() {
        let now = dt(2025, 3, 10, 12, 0);
        let lessons = vec![
            lesson_at(dt(2025, 3, 3, 10, 0), 1.0, 60.0, false),
            lesson_at(dt(2025, 3, 5, 10, 0), 1.5, 60.0, true),
            lesson_at(dt(2025, 3, 12, 10, 0), 2.0, 55.0, false),
        ];
        let totals = LessonTotals::compute(&lessons, now);

        assert_eq!(totals.lesson_count, 3);
        assert!((totals.total_hours - 4.5).abs() < 1e-9);
        assert!(
            (totals.total_value - (totals.total_paid + totals.total_unpaid)).abs() < 1e-9
        );
        assert_eq!(totals.unpaid_lesson_count, 2);
        assert_eq!(totals.upcoming_lesson_count, 1);
    }
}
