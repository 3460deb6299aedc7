//! Report export domain logic.
//!
//! Writes the rendered monthly report to disk and optionally hands it to the
//! host's default application. File I/O problems come back as failed
//! responses rather than errors: the report itself was built fine, only the
//! machine refused to take it. The write is all-or-nothing (temp file plus
//! rename), so a failed export never leaves a usable half-written report.

use anyhow::Result;
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use shared::ExportReportResponse;

use crate::backend::domain::commands::reports::{ExportReportCommand, MonthlyReportQuery};
use crate::backend::domain::report_service::ReportService;
use crate::backend::storage::Connection;

/// Export service that writes rendered reports to disk
#[derive(Clone)]
pub struct ExportService {
    /// Directory reports land in; None picks the host temp directory
    export_directory: Option<PathBuf>,
}

impl ExportService {
    /// Create a new ExportService writing into the host temp directory
    pub fn new() -> Self {
        Self {
            export_directory: None,
        }
    }

    /// Create an ExportService writing into a fixed directory
    pub fn with_export_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            export_directory: Some(directory.into()),
        }
    }

    /// Build the monthly report and write its CSV to disk.
    ///
    /// Validation problems (bad month) are errors; anything going wrong with
    /// the filesystem is reported through `success: false`.
    pub async fn export_report<C: Connection>(
        &self,
        command: ExportReportCommand,
        report_service: &ReportService<C>,
    ) -> Result<ExportReportResponse> {
        info!(
            "📁 EXPORT: Exporting report for {}/{}",
            command.month, command.year
        );

        let report = report_service
            .build_monthly_report(MonthlyReportQuery {
                year: command.year,
                month: command.month,
            })
            .await?;

        let export_dir = self.resolve_export_directory();
        if let Err(e) = fs::create_dir_all(&export_dir) {
            error!(
                "❌ EXPORT: Cannot create export directory {:?}: {}",
                export_dir, e
            );
            return Ok(ExportReportResponse {
                success: false,
                message: format!("Failed to create export directory: {}", e),
                file_path: None,
                filename: report.filename,
            });
        }

        let file_path = export_dir.join(&report.filename);
        let temp_path = file_path.with_extension("csv.tmp");
        if let Err(e) = fs::write(&temp_path, &report.csv_content) {
            error!("❌ EXPORT: Failed to write {:?}: {}", temp_path, e);
            return Ok(ExportReportResponse {
                success: false,
                message: format!("Failed to write report file: {}", e),
                file_path: None,
                filename: report.filename,
            });
        }
        if let Err(e) = fs::rename(&temp_path, &file_path) {
            let _ = fs::remove_file(&temp_path);
            error!("❌ EXPORT: Failed to move report into place: {}", e);
            return Ok(ExportReportResponse {
                success: false,
                message: format!("Failed to write report file: {}", e),
                file_path: None,
                filename: report.filename,
            });
        }

        let file_path_str = file_path.to_string_lossy().to_string();
        info!(
            "✅ EXPORT: Report written to {} ({} bytes)",
            file_path_str,
            report.csv_content.len()
        );

        if command.open_after_export && !Self::open_file(&file_path) {
            warn!("📁 EXPORT: Report saved but could not be opened automatically");
        }

        Ok(ExportReportResponse {
            success: true,
            message: format!("Report exported to: {}", file_path_str),
            file_path: Some(file_path_str),
            filename: report.filename,
        })
    }

    fn resolve_export_directory(&self) -> PathBuf {
        match &self.export_directory {
            Some(directory) => directory.clone(),
            None => std::env::temp_dir(),
        }
    }

    /// Hand the file to the host default application
    fn open_file(path: &Path) -> bool {
        #[cfg(target_os = "macos")]
        let opener = "open";
        #[cfg(not(target_os = "macos"))]
        let opener = "xdg-open";

        match Command::new(opener).arg(path).spawn() {
            Ok(_) => true,
            Err(e) => {
                warn!("📁 EXPORT: Could not launch {}: {}", opener, e);
                false
            }
        }
    }
}

impl Default for ExportService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::models::{Lesson, Student, ValidationError};
    use crate::backend::storage::csv::CsvConnection;
    use crate::backend::storage::{LessonStorage, StudentStorage};
    use chrono::{NaiveDate, Utc};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct TestStack {
        export_service: ExportService,
        report_service: ReportService<CsvConnection>,
        export_dir: PathBuf,
        connection: Arc<CsvConnection>,
        _temp_dir: TempDir,
    }

    fn setup_test() -> TestStack {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        let export_dir = temp_dir.path().join("exports");
        let connection = Arc::new(CsvConnection::new(&data_dir).unwrap());
        let report_service = ReportService::new(connection.clone());
        let export_service = ExportService::with_export_directory(&export_dir);

        TestStack {
            export_service,
            report_service,
            export_dir,
            connection,
            _temp_dir: temp_dir,
        }
    }

    async fn seed_march_lesson(stack: &TestStack) {
        let now = Utc::now();
        let student = Student {
            id: Student::generate_id(),
            name: "Anna Nowak".to_string(),
            first_name: None,
            last_name: None,
            phone: None,
            email: None,
            billing_id: Some("A1".to_string()),
            lesson_link: None,
            created_at: now,
            updated_at: now,
        };
        stack
            .connection
            .create_student_repository()
            .store_student(&student)
            .await
            .unwrap();

        let lesson = Lesson {
            id: Lesson::generate_id(),
            student_id: student.id,
            date: NaiveDate::from_ymd_opt(2025, 3, 3)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            duration_hours: 1.0,
            hourly_rate: 60.0,
            paid: false,
            notes: None,
            calendar_event_id: None,
            synced_with_calendar: false,
            created_at: now,
            updated_at: now,
        };
        stack
            .connection
            .create_lesson_repository()
            .store_lesson(&lesson)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_export_writes_rendered_report() {
        let stack = setup_test();
        seed_march_lesson(&stack).await;

        let response = stack
            .export_service
            .export_report(
                ExportReportCommand {
                    year: 2025,
                    month: 3,
                    open_after_export: false,
                },
                &stack.report_service,
            )
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.filename, "Raport_2025_3.csv");

        let written = fs::read_to_string(stack.export_dir.join("Raport_2025_3.csv")).unwrap();
        let rendered = stack
            .report_service
            .build_monthly_report(MonthlyReportQuery { year: 2025, month: 3 })
            .await
            .unwrap()
            .csv_content;
        assert_eq!(written, rendered);

        // No leftover temp file
        assert!(!stack.export_dir.join("Raport_2025_3.csv.tmp").exists());
    }

    #[tokio::test]
    async fn test_export_failure_reports_instead_of_erroring() {
        let stack = setup_test();
        seed_march_lesson(&stack).await;

        // A file where the export directory should be makes the write fail
        fs::create_dir_all(stack.export_dir.parent().unwrap()).unwrap();
        fs::write(&stack.export_dir, b"blocker").unwrap();

        let response = stack
            .export_service
            .export_report(
                ExportReportCommand {
                    year: 2025,
                    month: 3,
                    open_after_export: false,
                },
                &stack.report_service,
            )
            .await
            .unwrap();

        assert!(!response.success);
        assert_eq!(response.file_path, None);
    }

    #[tokio::test]
    async fn test_export_rejects_invalid_month() {
        let stack = setup_test();

        let err = stack
            .export_service
            .export_report(
                ExportReportCommand {
                    year: 2025,
                    month: 0,
                    open_after_export: false,
                },
                &stack.report_service,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::InvalidMonth(0))
        ));
    }
}
