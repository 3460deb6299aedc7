use anyhow::Result;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::backend::storage::traits::Connection;

/// Header row of every lessons.csv file
pub const LESSONS_CSV_HEADER: &str =
    "id,student_id,date,duration_hours,hourly_rate,paid,notes,calendar_event_id,synced_with_calendar,created_at,updated_at";

/// CsvConnection manages file paths and ensures data files exist for each
/// student. One directory per student holds `student.yaml` and `lessons.csv`;
/// the base directory additionally holds `settings.yaml`.
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: Arc<Mutex<PathBuf>>,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }

        Ok(Self {
            base_directory: Arc::new(Mutex::new(base_path)),
        })
    }

    /// Create a new CSV connection in the default data directory,
    /// ~/Documents/Lesson Tracker
    pub fn new_default() -> Result<Self> {
        let data_dir = Self::get_default_data_directory()?;
        info!("Using data directory: {}", data_dir.display());
        Self::new(data_dir)
    }

    /// Get the directory path for a student's data using the directory name
    pub fn get_student_directory(&self, directory_name: &str) -> PathBuf {
        let base_dir = self.base_directory.lock().unwrap();
        base_dir.join(directory_name)
    }

    /// Get the file path for a student's lessons using the directory name
    pub fn get_lessons_file_path(&self, directory_name: &str) -> PathBuf {
        self.get_student_directory(directory_name).join("lessons.csv")
    }

    /// Ensure a lessons CSV file exists with proper header for the student
    pub fn ensure_lessons_file_exists(&self, directory_name: &str) -> Result<()> {
        let student_dir = self.get_student_directory(directory_name);

        if !student_dir.exists() {
            fs::create_dir_all(&student_dir)?;
        }

        let file_path = student_dir.join("lessons.csv");

        if !file_path.exists() {
            fs::write(&file_path, format!("{}\n", LESSONS_CSV_HEADER))?;
        }

        Ok(())
    }

    /// Get the base directory path
    pub fn base_directory(&self) -> PathBuf {
        let base_dir = self.base_directory.lock().unwrap();
        base_dir.clone()
    }

    /// Get the default data directory path
    fn get_default_data_directory() -> Result<PathBuf> {
        let documents_dir = match dirs::document_dir() {
            Some(dir) => dir,
            None => {
                let home_dir = std::env::var("HOME")
                    .or_else(|_| std::env::var("USERPROFILE"))
                    .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;
                PathBuf::from(home_dir).join("Documents")
            }
        };
        Ok(documents_dir.join("Lesson Tracker"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_base_directory() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let base = temp_dir.path().join("data");
        assert!(!base.exists());

        let connection = CsvConnection::new(&base)?;
        assert!(base.exists());
        assert_eq!(connection.base_directory(), base);
        Ok(())
    }

    #[test]
    fn test_ensure_lessons_file_writes_header_once() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let connection = CsvConnection::new(temp_dir.path())?;

        connection.ensure_lessons_file_exists("anna_nowak")?;
        let path = connection.get_lessons_file_path("anna_nowak");
        assert!(path.exists());

        let contents = fs::read_to_string(&path)?;
        assert_eq!(contents, format!("{}\n", LESSONS_CSV_HEADER));

        // A second call must not truncate existing data
        fs::write(&path, format!("{}\nsome,row\n", LESSONS_CSV_HEADER))?;
        connection.ensure_lessons_file_exists("anna_nowak")?;
        let contents = fs::read_to_string(&path)?;
        assert!(contents.contains("some,row"));
        Ok(())
    }

    #[test]
    fn test_student_directory_is_under_base() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let connection = CsvConnection::new(temp_dir.path())?;
        let dir = connection.get_student_directory("anna_nowak");
        assert_eq!(dir, temp_dir.path().join("anna_nowak"));
        Ok(())
    }
}

impl Connection for CsvConnection {
    type StudentRepository = super::student_repository::StudentRepository;
    type LessonRepository = super::lesson_repository::LessonRepository;
    type SettingsRepository = super::settings_repository::SettingsRepository;

    fn create_student_repository(&self) -> Self::StudentRepository {
        super::student_repository::StudentRepository::new(Arc::new(self.clone()))
    }

    fn create_lesson_repository(&self) -> Self::LessonRepository {
        super::lesson_repository::LessonRepository::new(self.clone())
    }

    fn create_settings_repository(&self) -> Self::SettingsRepository {
        super::settings_repository::SettingsRepository::new(self.clone())
    }
}
