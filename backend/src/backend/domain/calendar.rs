//! Calendar grid domain logic.
//!
//! Builds the month, week and day grids the frontend renders lessons onto,
//! and keeps the in-memory focus month for calendar navigation. All date
//! arithmetic lives here so the UI only handles presentation concerns.
//!
//! Grids are pure functions of (reference date, lesson list): the service
//! never talks to storage. Month grids are always whole 7-day rows; the
//! padding cells carry real adjacent-month dates so the frontend can render
//! them dimmed without recomputing anything.

use chrono::{Datelike, Duration, Local, NaiveDate, Timelike, Weekday};
use log::{debug, warn};
use shared::{
    CalendarDay, CalendarDaySchedule, CalendarDayType, CalendarFocusDate, CalendarMonth,
    CalendarWeek, CurrentDateResponse, DayScheduleHour, Lesson,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::backend::domain::models::LESSON_DATE_FORMAT;

/// First hour slot of the day schedule (inclusive)
pub const DAY_SCHEDULE_FIRST_HOUR: u32 = 8;
/// Last hour slot of the day schedule (inclusive)
pub const DAY_SCHEDULE_LAST_HOUR: u32 = 22;

/// Calendar service that handles all grid-related business logic
#[derive(Clone)]
pub struct CalendarService {
    /// Current focus month for calendar navigation (month/year only).
    /// Kept in memory and not persisted.
    focus_date: Arc<Mutex<CalendarFocusDate>>,
    /// First column of every grid row
    week_start: Weekday,
}

impl CalendarService {
    /// Create a new CalendarService with Monday week rows
    pub fn new() -> Self {
        Self::with_week_start(Weekday::Mon)
    }

    /// Create a CalendarService with a specific week start day
    pub fn with_week_start(week_start: Weekday) -> Self {
        Self {
            focus_date: Arc::new(Mutex::new(CalendarFocusDate::default())),
            week_start,
        }
    }

    /// Generate a month grid with the given lessons bucketed onto its days.
    ///
    /// The grid always holds a whole number of 7-day rows: days of the
    /// previous month pad the front up to the configured week start, days of
    /// the next month pad the back. Every cell carries its real date.
    pub fn generate_calendar_month(
        &self,
        month: u32,
        year: u32,
        lessons: Vec<Lesson>,
    ) -> CalendarMonth {
        let Some(first_of_month) = NaiveDate::from_ymd_opt(year as i32, month, 1) else {
            warn!("🗓️ Cannot build grid for invalid month {}/{}", month, year);
            return CalendarMonth {
                month,
                year,
                days: Vec::new(),
                first_day_of_week: 0,
            };
        };

        let days_in_month = self.days_in_month(month, year);
        let first_column = self.first_day_column(month, year);
        let grid_start = first_of_month - Duration::days(first_column as i64);

        let used_cells = first_column + days_in_month;
        let total_cells = used_cells + (7 - used_cells % 7) % 7;

        debug!(
            "🗓️ Grid for {}/{}: {} days, first column {}, {} cells",
            month, year, days_in_month, first_column, total_cells
        );

        let mut lessons_by_day = Self::group_lessons_by_day(lessons);
        let mut days = Vec::with_capacity(total_cells as usize);
        for offset in 0..total_cells {
            let date = grid_start + Duration::days(offset as i64);
            let day_type = if date < first_of_month {
                CalendarDayType::LeadingDay
            } else if date.month() != month || date.year() != year as i32 {
                CalendarDayType::TrailingDay
            } else {
                CalendarDayType::MonthDay
            };

            days.push(CalendarDay {
                date: date.format("%Y-%m-%d").to_string(),
                day: date.day(),
                day_type,
                lessons: lessons_by_day.remove(&date).unwrap_or_default(),
            });
        }

        CalendarMonth {
            month,
            year,
            days,
            first_day_of_week: first_column,
        }
    }

    /// Generate the week grid containing the reference date.
    /// Week cells are all real days, so they are typed `MonthDay`.
    pub fn generate_calendar_week(
        &self,
        reference: NaiveDate,
        lessons: Vec<Lesson>,
    ) -> CalendarWeek {
        let start = self.week_start_of(reference);
        let mut lessons_by_day = Self::group_lessons_by_day(lessons);

        let days = (0..7)
            .map(|offset| {
                let date = start + Duration::days(offset);
                CalendarDay {
                    date: date.format("%Y-%m-%d").to_string(),
                    day: date.day(),
                    day_type: CalendarDayType::MonthDay,
                    lessons: lessons_by_day.remove(&date).unwrap_or_default(),
                }
            })
            .collect();

        CalendarWeek {
            start_date: start.format("%Y-%m-%d").to_string(),
            days,
        }
    }

    /// Generate the working-hours timeline of a single day.
    ///
    /// Lessons of other days are ignored; a same-day lesson starting outside
    /// 08:00-22:00 has no slot and is dropped from the schedule.
    pub fn generate_day_schedule(
        &self,
        date: NaiveDate,
        lessons: Vec<Lesson>,
    ) -> CalendarDaySchedule {
        let mut lessons_by_hour: HashMap<u32, Vec<Lesson>> = HashMap::new();
        for lesson in lessons {
            let Some(start) = Self::parse_lesson_date(&lesson) else {
                continue;
            };
            if start.date() != date {
                continue;
            }
            let hour = start.hour();
            if !(DAY_SCHEDULE_FIRST_HOUR..=DAY_SCHEDULE_LAST_HOUR).contains(&hour) {
                debug!(
                    "🗓️ Lesson {} starts at {:02}:00, outside the schedule range",
                    lesson.id, hour
                );
                continue;
            }
            lessons_by_hour.entry(hour).or_default().push(lesson);
        }
        for slot in lessons_by_hour.values_mut() {
            slot.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        }

        let hours = (DAY_SCHEDULE_FIRST_HOUR..=DAY_SCHEDULE_LAST_HOUR)
            .map(|hour| DayScheduleHour {
                hour,
                label: format!("{:02}:00", hour),
                lessons: lessons_by_hour.remove(&hour).unwrap_or_default(),
            })
            .collect();

        CalendarDaySchedule {
            date: date.format("%Y-%m-%d").to_string(),
            hours,
        }
    }

    /// Get the number of days in a given month and year
    pub fn days_in_month(&self, month: u32, year: u32) -> u32 {
        match month {
            2 => {
                if self.is_leap_year(year) {
                    29
                } else {
                    28
                }
            }
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    /// Check if a year is a leap year
    pub fn is_leap_year(&self, year: u32) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    /// Grid column (0-6) the first day of the month lands in
    pub fn first_day_column(&self, month: u32, year: u32) -> u32 {
        match NaiveDate::from_ymd_opt(year as i32, month, 1) {
            Some(date) => self.column_of(date),
            None => 0,
        }
    }

    /// Get the human-readable name for a month number
    pub fn month_name(&self, month: u32) -> &'static str {
        match month {
            1 => "January",
            2 => "February",
            3 => "March",
            4 => "April",
            5 => "May",
            6 => "June",
            7 => "July",
            8 => "August",
            9 => "September",
            10 => "October",
            11 => "November",
            12 => "December",
            _ => "Invalid Month",
        }
    }

    /// Navigate to the previous month
    pub fn previous_month(&self, current_month: u32, current_year: u32) -> (u32, u32) {
        if current_month == 1 {
            (12, current_year - 1)
        } else {
            (current_month - 1, current_year)
        }
    }

    /// Navigate to the next month
    pub fn next_month(&self, current_month: u32, current_year: u32) -> (u32, u32) {
        if current_month == 12 {
            (1, current_year + 1)
        } else {
            (current_month + 1, current_year)
        }
    }

    /// Get current date information
    pub fn get_current_date(&self) -> CurrentDateResponse {
        let now = Local::now();
        let month = now.month();
        let year = now.year() as u32;
        let day = now.day();

        let formatted_date = format!("{} {}, {}", self.month_name(month), day, year);
        let iso_date = format!("{:04}-{:02}-{:02}", year, month, day);

        CurrentDateResponse {
            month,
            year,
            day,
            formatted_date,
            iso_date,
        }
    }

    /// Get the current focus month for calendar navigation
    pub fn get_focus_date(&self) -> CalendarFocusDate {
        self.focus_date.lock().unwrap().clone()
    }

    /// Set the focus month for calendar navigation
    pub fn set_focus_date(&self, month: u32, year: u32) -> Result<CalendarFocusDate, String> {
        if !(1..=12).contains(&month) {
            return Err(format!("Invalid month: {}. Must be between 1 and 12", month));
        }

        let new_focus_date = CalendarFocusDate { month, year };
        {
            let mut focus_date = self.focus_date.lock().unwrap();
            *focus_date = new_focus_date.clone();
        }

        Ok(new_focus_date)
    }

    /// Move the focus one month back
    pub fn navigate_previous_month(&self) -> CalendarFocusDate {
        let current = self.get_focus_date();
        let (month, year) = self.previous_month(current.month, current.year);

        // Cannot fail, previous_month only returns valid months
        self.set_focus_date(month, year).unwrap()
    }

    /// Move the focus one month forward
    pub fn navigate_next_month(&self) -> CalendarFocusDate {
        let current = self.get_focus_date();
        let (month, year) = self.next_month(current.month, current.year);

        // Cannot fail, next_month only returns valid months
        self.set_focus_date(month, year).unwrap()
    }

    /// First day of the week row containing the given date
    fn week_start_of(&self, date: NaiveDate) -> NaiveDate {
        date - Duration::days(self.column_of(date) as i64)
    }

    /// Column (0-6) of a date relative to the configured week start
    fn column_of(&self, date: NaiveDate) -> u32 {
        (7 + date.weekday().num_days_from_monday() - self.week_start.num_days_from_monday()) % 7
    }

    /// Bucket lessons by the calendar day of their start instant.
    /// Rows with an unparsable date never make it out of storage, so a
    /// parse failure here only means the caller handed over foreign data.
    fn group_lessons_by_day(lessons: Vec<Lesson>) -> HashMap<NaiveDate, Vec<Lesson>> {
        let mut by_day: HashMap<NaiveDate, Vec<Lesson>> = HashMap::new();
        for lesson in lessons {
            let Some(start) = Self::parse_lesson_date(&lesson) else {
                continue;
            };
            by_day.entry(start.date()).or_default().push(lesson);
        }
        for day_lessons in by_day.values_mut() {
            day_lessons.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        }
        by_day
    }

    fn parse_lesson_date(lesson: &Lesson) -> Option<chrono::NaiveDateTime> {
        match chrono::NaiveDateTime::parse_from_str(&lesson.date, LESSON_DATE_FORMAT) {
            Ok(start) => Some(start),
            Err(_) => {
                debug!("🗓️ Skipping lesson {} with bad date '{}'", lesson.id, lesson.date);
                None
            }
        }
    }
}

impl Default for CalendarService {
    fn default() -> Self {
        Self::new()
    }
}
