//! Monthly billing report aggregation.
//!
//! Turns the lessons of one calendar month into the billing tree the tutor
//! sends out: lessons grouped per student, students clustered under their
//! billing ID, subtotals per student and per cluster, a grand total for the
//! month. Students without a billing ID are billed under their display name,
//! so every student lands in exactly one group.
//!
//! The CSV rendering is deterministic: groups are ordered by key, students
//! by display name, lessons by start date, and all numbers are printed with
//! two decimals, so identical data renders to identical bytes.

use anyhow::Result;
use log::{info, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use shared::{BillingGroup, MonthlyReport, MonthlyReportResponse, ReportRow, StudentReportSection};

use crate::backend::domain::commands::reports::MonthlyReportQuery;
use crate::backend::domain::models::{Lesson, Student, ValidationError};
use crate::backend::storage::{Connection, LessonStorage, StudentStorage};

/// Payment labels as printed on the report
const STATUS_PAID: &str = "Opłacone";
const STATUS_UNPAID: &str = "Nieopłacone";

/// Polish month name for report headers and labels
pub fn month_name_pl(month: u32) -> &'static str {
    match month {
        1 => "Styczeń",
        2 => "Luty",
        3 => "Marzec",
        4 => "Kwiecień",
        5 => "Maj",
        6 => "Czerwiec",
        7 => "Lipiec",
        8 => "Sierpień",
        9 => "Wrzesień",
        10 => "Październik",
        11 => "Listopad",
        12 => "Grudzień",
        _ => "Nieznany miesiąc",
    }
}

/// Service building monthly billing reports
#[derive(Clone)]
pub struct ReportService<C: Connection> {
    lesson_repository: C::LessonRepository,
    student_repository: C::StudentRepository,
}

impl<C: Connection> ReportService<C> {
    /// Create a new ReportService
    pub fn new(connection: Arc<C>) -> Self {
        let lesson_repository = connection.create_lesson_repository();
        let student_repository = connection.create_student_repository();
        Self {
            lesson_repository,
            student_repository,
        }
    }

    /// Build the report for one calendar month together with its CSV
    /// rendering and suggested file name
    pub async fn build_monthly_report(
        &self,
        query: MonthlyReportQuery,
    ) -> Result<MonthlyReportResponse> {
        if !(1..=12).contains(&query.month) {
            return Err(ValidationError::InvalidMonth(query.month).into());
        }

        info!("📊 Building report for {}/{}", query.month, query.year);

        let lessons = self
            .lesson_repository
            .list_lessons_in_month(query.year, query.month)
            .await?;
        let students = self.student_repository.list_students().await?;

        let report = Self::aggregate(query.year, query.month, lessons, &students);
        let csv_content = Self::render_csv(&report);
        let filename = Self::report_filename(query.year, query.month);

        info!(
            "📊 Report for {}/{}: {} groups, {:.2} h, {:.2} PLN",
            query.month, query.year, report.groups.len(), report.total_hours, report.total_amount
        );

        Ok(MonthlyReportResponse {
            report,
            csv_content,
            filename,
        })
    }

    /// File name a report of this month exports under
    pub fn report_filename(year: i32, month: u32) -> String {
        format!("Raport_{}_{}.csv", year, month)
    }

    /// Cluster the month's lessons into the billing tree
    fn aggregate(year: i32, month: u32, lessons: Vec<Lesson>, students: &[Student]) -> MonthlyReport {
        let students_by_id: HashMap<&str, &Student> =
            students.iter().map(|s| (s.id.as_str(), s)).collect();

        let mut lessons_by_student: HashMap<String, Vec<Lesson>> = HashMap::new();
        for lesson in lessons {
            if students_by_id.contains_key(lesson.student_id.as_str()) {
                lessons_by_student
                    .entry(lesson.student_id.clone())
                    .or_default()
                    .push(lesson);
            } else {
                warn!(
                    "📊 Lesson {} has no student record, leaving it off the report",
                    lesson.id
                );
            }
        }

        // BTreeMap keeps billing groups in key order
        let mut sections_by_key: BTreeMap<String, Vec<StudentReportSection>> = BTreeMap::new();
        for (student_id, mut student_lessons) in lessons_by_student {
            let student = students_by_id[student_id.as_str()];
            student_lessons.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

            let rows: Vec<ReportRow> = student_lessons.iter().map(Self::report_row).collect();
            let total_hours = rows.iter().map(|row| row.duration_hours).sum();
            let total_amount = rows.iter().map(|row| row.amount).sum();

            sections_by_key
                .entry(student.billing_key())
                .or_default()
                .push(StudentReportSection {
                    student_id,
                    student_name: student.display_name(),
                    rows,
                    total_hours,
                    total_amount,
                });
        }

        let mut groups = Vec::with_capacity(sections_by_key.len());
        let mut month_hours = 0.0;
        let mut month_amount = 0.0;
        for (billing_key, mut sections) in sections_by_key {
            sections.sort_by(|a, b| {
                a.student_name
                    .cmp(&b.student_name)
                    .then_with(|| a.student_id.cmp(&b.student_id))
            });
            let total_hours: f64 = sections.iter().map(|s| s.total_hours).sum();
            let total_amount: f64 = sections.iter().map(|s| s.total_amount).sum();
            month_hours += total_hours;
            month_amount += total_amount;

            groups.push(BillingGroup {
                billing_key,
                students: sections,
                total_hours,
                total_amount,
            });
        }

        MonthlyReport {
            month,
            year: year as u32,
            month_label: format!("{} {}", month_name_pl(month), year),
            groups,
            total_hours: month_hours,
            total_amount: month_amount,
        }
    }

    fn report_row(lesson: &Lesson) -> ReportRow {
        ReportRow {
            date: lesson.date.format("%Y-%m-%d %H:%M").to_string(),
            duration_hours: lesson.duration_hours,
            hourly_rate: lesson.hourly_rate,
            amount: lesson.total_value(),
            paid: lesson.paid,
            status_label: if lesson.paid { STATUS_PAID } else { STATUS_UNPAID }.to_string(),
        }
    }

    /// Render the semicolon-delimited CSV text of a report
    pub fn render_csv(report: &MonthlyReport) -> String {
        let mut csv = String::new();
        csv.push_str(&format!("Raport korepetycji za {}\n\n", report.month_label));

        for group in &report.groups {
            csv.push_str(&format!("ID Rozliczeniowe: {}\n", group.billing_key));

            for student in &group.students {
                csv.push_str("Data;Czas trwania (h);Stawka (PLN/h);Kwota (PLN);Status\n");
                for row in &student.rows {
                    csv.push_str(&format!(
                        "{};{:.2};{:.2};{:.2};{}\n",
                        row.date, row.duration_hours, row.hourly_rate, row.amount, row.status_label
                    ));
                }
                csv.push_str(&format!(
                    "Suma ({}): {:.2} h, {:.2} PLN\n",
                    student.student_name, student.total_hours, student.total_amount
                ));
            }

            csv.push_str(&format!(
                "Suma dla ID {}: {:.2} h, {:.2} PLN\n\n",
                group.billing_key, group.total_hours, group.total_amount
            ));
        }

        csv.push_str("PODSUMOWANIE MIESIĄCA\n");
        csv.push_str(&format!("Łączna liczba godzin: {:.2}\n", report.total_hours));
        csv.push_str(&format!("Łączna należność: {:.2} PLN\n", report.total_amount));
        csv
    }
}
