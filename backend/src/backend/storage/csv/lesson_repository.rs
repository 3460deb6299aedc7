use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use csv::{Reader, StringRecord, Writer};
use log::{debug, info, warn};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::sync::Arc;

use super::connection::{CsvConnection, LESSONS_CSV_HEADER};
use super::student_repository::StudentRepository;
use crate::backend::domain::models::lesson::{Lesson, LESSON_DATE_FORMAT};

/// CSV-based lesson repository. Each student directory holds a lessons.csv
/// with that student's lessons; rows that fail to parse are skipped with a
/// warning instead of poisoning the whole file.
#[derive(Clone)]
pub struct LessonRepository {
    connection: CsvConnection,
    student_repository: StudentRepository,
}

impl LessonRepository {
    /// Create a new CSV lesson repository
    pub fn new(connection: CsvConnection) -> Self {
        let student_repository = StudentRepository::new(Arc::new(connection.clone()));
        Self {
            connection,
            student_repository,
        }
    }

    /// Resolve the directory holding a student's files
    async fn directory_for_student(&self, student_id: &str) -> Result<Option<String>> {
        self.student_repository
            .find_directory_by_student_id(student_id)
            .await
    }

    /// List every student directory under the base directory
    fn student_directories(&self) -> Result<Vec<String>> {
        let base_dir = self.connection.base_directory();
        if !base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut directories = Vec::new();
        for entry in std::fs::read_dir(base_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                directories.push(name);
            }
        }
        directories.sort();
        Ok(directories)
    }

    /// Read all lessons from one student directory's CSV file
    async fn read_lessons(&self, directory_name: &str) -> Result<Vec<Lesson>> {
        self.connection.ensure_lessons_file_exists(directory_name)?;

        let file_path = self.connection.get_lessons_file_path(directory_name);
        let file = File::open(&file_path)?;
        let reader = BufReader::new(file);
        let mut csv_reader = Reader::from_reader(reader);

        let mut lessons = Vec::new();

        for result in csv_reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping malformed CSV row in {:?}: {}", file_path, e);
                    continue;
                }
            };

            match Self::parse_lesson_record(&record) {
                Ok(lesson) => lessons.push(lesson),
                Err(e) => {
                    warn!("Skipping unparsable lesson row in {:?}: {}", file_path, e);
                }
            }
        }

        lessons.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(lessons)
    }

    /// Parse one CSV record into a lesson
    fn parse_lesson_record(record: &StringRecord) -> Result<Lesson> {
        let field = |index: usize| record.get(index).unwrap_or("").to_string();

        let id = field(0);
        let student_id = field(1);
        if id.is_empty() || student_id.is_empty() {
            anyhow::bail!("missing id or student_id");
        }

        let raw_date = field(2);
        let date = NaiveDateTime::parse_from_str(&raw_date, LESSON_DATE_FORMAT)
            .map_err(|e| anyhow::anyhow!("invalid date '{}': {}", raw_date, e))?;

        let duration_hours = field(3)
            .parse::<f64>()
            .map_err(|e| anyhow::anyhow!("invalid duration '{}': {}", field(3), e))?;
        let hourly_rate = field(4)
            .parse::<f64>()
            .map_err(|e| anyhow::anyhow!("invalid hourly rate '{}': {}", field(4), e))?;

        let notes = Some(field(6)).filter(|s| !s.is_empty());
        let calendar_event_id = Some(field(7)).filter(|s| !s.is_empty());

        // Audit timestamps default to the Unix epoch when unreadable
        let created_at = DateTime::parse_from_rfc3339(&field(9))
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default();
        let updated_at = DateTime::parse_from_rfc3339(&field(10))
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_default();

        Ok(Lesson {
            id,
            student_id,
            date,
            duration_hours,
            hourly_rate,
            paid: field(5).parse::<bool>().unwrap_or(false),
            notes,
            calendar_event_id,
            synced_with_calendar: field(8).parse::<bool>().unwrap_or(false),
            created_at,
            updated_at,
        })
    }

    /// Write all lessons for one student directory to its CSV file
    async fn write_lessons(&self, directory_name: &str, lessons: &[Lesson]) -> Result<()> {
        self.connection.ensure_lessons_file_exists(directory_name)?;
        let file_path = self.connection.get_lessons_file_path(directory_name);

        // Atomic write via temp file
        let temp_path = file_path.with_extension("tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;

            let writer = BufWriter::new(file);
            let mut csv_writer = Writer::from_writer(writer);

            csv_writer.write_record(LESSONS_CSV_HEADER.split(','))?;

            for lesson in lessons {
                csv_writer.write_record(&[
                    lesson.id.clone(),
                    lesson.student_id.clone(),
                    lesson.date.format(LESSON_DATE_FORMAT).to_string(),
                    lesson.duration_hours.to_string(),
                    lesson.hourly_rate.to_string(),
                    lesson.paid.to_string(),
                    lesson.notes.clone().unwrap_or_default(),
                    lesson.calendar_event_id.clone().unwrap_or_default(),
                    lesson.synced_with_calendar.to_string(),
                    lesson.created_at.to_rfc3339(),
                    lesson.updated_at.to_rfc3339(),
                ])?;
            }

            csv_writer.flush()?;
        }

        std::fs::rename(&temp_path, &file_path)?;
        debug!("Wrote {} lessons to {:?}", lessons.len(), file_path);
        Ok(())
    }
}

#[async_trait]
impl crate::backend::storage::LessonStorage for LessonRepository {
    async fn store_lesson(&self, lesson: &Lesson) -> Result<()> {
        let directory_name = self
            .directory_for_student(&lesson.student_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Student not found: {}", lesson.student_id))?;

        let mut lessons = self.read_lessons(&directory_name).await?;
        lessons.push(lesson.clone());
        lessons.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        self.write_lessons(&directory_name, &lessons).await?;
        info!("Stored lesson {} for student {}", lesson.id, lesson.student_id);
        Ok(())
    }

    async fn get_lesson(&self, lesson_id: &str) -> Result<Option<Lesson>> {
        for directory_name in self.student_directories()? {
            let lessons = self.read_lessons(&directory_name).await?;
            if let Some(lesson) = lessons.into_iter().find(|l| l.id == lesson_id) {
                return Ok(Some(lesson));
            }
        }
        Ok(None)
    }

    async fn list_lessons_for_student(&self, student_id: &str) -> Result<Vec<Lesson>> {
        match self.directory_for_student(student_id).await? {
            Some(directory_name) => self.read_lessons(&directory_name).await,
            None => {
                debug!("No directory for student {}, returning empty lesson list", student_id);
                Ok(Vec::new())
            }
        }
    }

    async fn list_all_lessons(&self) -> Result<Vec<Lesson>> {
        let mut all_lessons = Vec::new();
        for directory_name in self.student_directories()? {
            all_lessons.extend(self.read_lessons(&directory_name).await?);
        }
        all_lessons.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(all_lessons)
    }

    async fn list_lessons_in_month(&self, year: i32, month: u32) -> Result<Vec<Lesson>> {
        let lessons = self.list_all_lessons().await?;
        Ok(lessons
            .into_iter()
            .filter(|l| l.date.year() == year && l.date.month() == month)
            .collect())
    }

    async fn list_lessons_in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Lesson>> {
        let lessons = self.list_all_lessons().await?;
        Ok(lessons
            .into_iter()
            .filter(|l| l.date >= start && l.date < end)
            .collect())
    }

    async fn update_lesson(&self, lesson: &Lesson) -> Result<()> {
        let directory_name = self
            .directory_for_student(&lesson.student_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Student not found: {}", lesson.student_id))?;

        let mut lessons = self.read_lessons(&directory_name).await?;
        let position = lessons
            .iter()
            .position(|l| l.id == lesson.id)
            .ok_or_else(|| anyhow::anyhow!("Lesson not found: {}", lesson.id))?;

        lessons[position] = lesson.clone();
        lessons.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        self.write_lessons(&directory_name, &lessons).await?;
        info!("Updated lesson {}", lesson.id);
        Ok(())
    }

    async fn delete_lesson(&self, student_id: &str, lesson_id: &str) -> Result<bool> {
        let directory_name = match self.directory_for_student(student_id).await? {
            Some(dir) => dir,
            None => return Ok(false),
        };

        let mut lessons = self.read_lessons(&directory_name).await?;
        let before = lessons.len();
        lessons.retain(|l| l.id != lesson_id);

        if lessons.len() == before {
            return Ok(false);
        }

        self.write_lessons(&directory_name, &lessons).await?;
        info!("Deleted lesson {} for student {}", lesson_id, student_id);
        Ok(true)
    }

    async fn delete_lessons_for_student(&self, student_id: &str) -> Result<u32> {
        let directory_name = match self.directory_for_student(student_id).await? {
            Some(dir) => dir,
            None => return Ok(0),
        };

        let lessons = self.read_lessons(&directory_name).await?;
        let count = lessons.len() as u32;

        if count > 0 {
            self.write_lessons(&directory_name, &[]).await?;
            info!("Deleted {} lessons for student {}", count, student_id);
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::models::student::Student;
    use crate::backend::storage::{LessonStorage, StudentStorage};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn make_lesson(id: &str, student_id: &str, date: NaiveDateTime) -> Lesson {
        Lesson {
            id: id.to_string(),
            student_id: student_id.to_string(),
            date,
            duration_hours: 1.0,
            hourly_rate: 60.0,
            paid: false,
            notes: None,
            calendar_event_id: None,
            synced_with_calendar: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn setup_with_student(name: &str, student_id: &str) -> (LessonRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();

        let student_repo = StudentRepository::new(Arc::new(connection.clone()));
        let now = Utc::now();
        student_repo
            .store_student(&Student {
                id: student_id.to_string(),
                name: name.to_string(),
                first_name: None,
                last_name: None,
                phone: None,
                email: None,
                billing_id: None,
                lesson_link: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        (LessonRepository::new(connection), temp_dir)
    }

    #[tokio::test]
    async fn test_store_and_list_sorted_by_date() {
        let (repo, _temp_dir) = setup_with_student("Anna Nowak", "student::1").await;

        repo.store_lesson(&make_lesson("lesson::b", "student::1", dt(2025, 3, 10, 10, 0)))
            .await
            .unwrap();
        repo.store_lesson(&make_lesson("lesson::a", "student::1", dt(2025, 3, 3, 10, 0)))
            .await
            .unwrap();

        let lessons = repo.list_lessons_for_student("student::1").await.unwrap();
        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[0].id, "lesson::a");
        assert_eq!(lessons[1].id, "lesson::b");
    }

    #[tokio::test]
    async fn test_get_lesson_scans_all_students() {
        let (repo, _temp_dir) = setup_with_student("Anna Nowak", "student::1").await;

        let lesson = make_lesson("lesson::x", "student::1", dt(2025, 3, 3, 10, 0));
        repo.store_lesson(&lesson).await.unwrap();

        let found = repo.get_lesson("lesson::x").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().student_id, "student::1");

        assert!(repo.get_lesson("lesson::missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_roundtrip_preserves_fields() {
        let (repo, _temp_dir) = setup_with_student("Anna Nowak", "student::1").await;

        let mut lesson = make_lesson("lesson::full", "student::1", dt(2025, 3, 3, 10, 0));
        lesson.duration_hours = 1.5;
        lesson.hourly_rate = 62.5;
        lesson.paid = true;
        lesson.notes = Some("Równania kwadratowe".to_string());
        lesson.calendar_event_id = Some("event::abc".to_string());
        lesson.synced_with_calendar = true;

        repo.store_lesson(&lesson).await.unwrap();
        let loaded = repo.get_lesson("lesson::full").await.unwrap().unwrap();

        assert_eq!(loaded.date, lesson.date);
        assert!((loaded.duration_hours - 1.5).abs() < 1e-9);
        assert!((loaded.hourly_rate - 62.5).abs() < 1e-9);
        assert!(loaded.paid);
        assert_eq!(loaded.notes.as_deref(), Some("Równania kwadratowe"));
        assert_eq!(loaded.calendar_event_id.as_deref(), Some("event::abc"));
        assert!(loaded.synced_with_calendar);
    }

    #[tokio::test]
    async fn test_list_lessons_in_month() {
        let (repo, _temp_dir) = setup_with_student("Anna Nowak", "student::1").await;

        repo.store_lesson(&make_lesson("lesson::mar", "student::1", dt(2025, 3, 31, 23, 0)))
            .await
            .unwrap();
        repo.store_lesson(&make_lesson("lesson::apr", "student::1", dt(2025, 4, 1, 0, 0)))
            .await
            .unwrap();

        let march = repo.list_lessons_in_month(2025, 3).await.unwrap();
        assert_eq!(march.len(), 1);
        assert_eq!(march[0].id, "lesson::mar");
    }

    #[tokio::test]
    async fn test_range_is_half_open() {
        let (repo, _temp_dir) = setup_with_student("Anna Nowak", "student::1").await;

        repo.store_lesson(&make_lesson("lesson::start", "student::1", dt(2025, 3, 3, 0, 0)))
            .await
            .unwrap();
        repo.store_lesson(&make_lesson("lesson::end", "student::1", dt(2025, 3, 10, 0, 0)))
            .await
            .unwrap();

        let lessons = repo
            .list_lessons_in_range(dt(2025, 3, 3, 0, 0), dt(2025, 3, 10, 0, 0))
            .await
            .unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].id, "lesson::start");
    }

    #[tokio::test]
    async fn test_delete_lesson_reports_outcome() {
        let (repo, _temp_dir) = setup_with_student("Anna Nowak", "student::1").await;

        repo.store_lesson(&make_lesson("lesson::a", "student::1", dt(2025, 3, 3, 10, 0)))
            .await
            .unwrap();

        assert!(repo.delete_lesson("student::1", "lesson::a").await.unwrap());
        assert!(!repo.delete_lesson("student::1", "lesson::a").await.unwrap());
        assert!(repo
            .list_lessons_for_student("student::1")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_lessons_for_student_counts() {
        let (repo, _temp_dir) = setup_with_student("Anna Nowak", "student::1").await;

        repo.store_lesson(&make_lesson("lesson::a", "student::1", dt(2025, 3, 3, 10, 0)))
            .await
            .unwrap();
        repo.store_lesson(&make_lesson("lesson::b", "student::1", dt(2025, 3, 4, 10, 0)))
            .await
            .unwrap();

        let deleted = repo.delete_lessons_for_student("student::1").await.unwrap();
        assert_eq!(deleted, 2);
        assert!(repo.list_all_lessons().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_rows_are_skipped() {
        let (repo, temp_dir) = setup_with_student("Anna Nowak", "student::1").await;

        let file_path = temp_dir.path().join("anna_nowak").join("lessons.csv");
        let good = "lesson::ok,student::1,2025-03-03T10:00:00,1.0,60.0,false,,,false,2025-03-01T00:00:00+00:00,2025-03-01T00:00:00+00:00";
        let bad = "lesson::bad,student::1,not-a-date,1.0,60.0,false,,,false,,";
        std::fs::write(
            &file_path,
            format!("{}\n{}\n{}\n", LESSONS_CSV_HEADER, good, bad),
        )
        .unwrap();

        let lessons = repo.list_lessons_for_student("student::1").await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].id, "lesson::ok");
    }
}
