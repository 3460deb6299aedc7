use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_yaml;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use super::connection::CsvConnection;
use crate::backend::domain::models::student::Student as DomainStudent;

/// Intermediate struct for YAML serialization with string date fields
#[derive(Debug, Clone, Serialize, Deserialize)]
struct YamlStudent {
    id: String,
    name: String,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    billing_id: Option<String>,
    lesson_link: Option<String>,
    created_at: String, // String representation for YAML
    updated_at: String, // String representation for YAML
}

/// Filesystem-discovery student repository: one directory per student with a
/// student.yaml inside
#[derive(Clone)]
pub struct StudentRepository {
    connection: Arc<CsvConnection>,
}

impl StudentRepository {
    /// Create a new CSV student repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    /// Generate a safe filesystem identifier from a student name
    /// Converts "Anna Nowak" -> "anna_nowak", "Michał Wiśniewski" ->
    /// "michal_wisniewski", etc.
    pub fn generate_safe_directory_name(student_name: &str) -> String {
        let mapped = student_name
            .to_lowercase()
            .chars()
            .map(|c| match c {
                // Polish diacritics first, they count as alphanumeric
                'ą' => 'a',
                'ć' => 'c',
                'ę' => 'e',
                'ł' => 'l',
                'ń' => 'n',
                'ś' => 's',
                'ż' | 'ź' => 'z',
                'á' | 'à' | 'ä' | 'â' => 'a',
                'é' | 'è' | 'ë' | 'ê' => 'e',
                'í' | 'ì' | 'ï' | 'î' => 'i',
                'ó' | 'ò' | 'ö' | 'ô' => 'o',
                'ú' | 'ù' | 'ü' | 'û' => 'u',
                'ñ' => 'n',
                'ç' => 'c',
                c if c.is_ascii_alphanumeric() => c,
                c if c.is_whitespace() => '_',
                _ => '_',
            })
            .collect::<String>();

        // Collapse runs of underscores left by consecutive special characters
        let mut collapsed = String::with_capacity(mapped.len());
        for c in mapped.chars() {
            if c == '_' && collapsed.ends_with('_') {
                continue;
            }
            collapsed.push(c);
        }

        collapsed.trim_matches('_').to_string()
    }

    /// Get the path to a student's YAML configuration file
    fn get_student_yaml_path(&self, directory_name: &str) -> PathBuf {
        self.connection
            .get_student_directory(directory_name)
            .join("student.yaml")
    }

    /// Discover all students by scanning directories
    async fn discover_students(&self) -> Result<Vec<DomainStudent>> {
        let base_dir = self.connection.base_directory();

        if !base_dir.exists() {
            debug!("Base directory doesn't exist, returning empty student list");
            return Ok(Vec::new());
        }

        let mut students = Vec::new();

        for entry in fs::read_dir(base_dir)? {
            let entry = entry?;
            let path = entry.path();

            if !path.is_dir() {
                continue;
            }

            let dir_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => {
                    warn!("Skipping directory with invalid name: {:?}", path);
                    continue;
                }
            };

            match self.load_student_from_directory(dir_name).await {
                Ok(Some(student)) => {
                    debug!("Discovered student: {} from directory: {}", student.name, dir_name);
                    students.push(student);
                }
                Ok(None) => {
                    debug!("Directory {} doesn't contain a valid student", dir_name);
                }
                Err(e) => {
                    warn!("Error loading student from directory {}: {}", dir_name, e);
                }
            }
        }

        // Sort by display name for consistent ordering
        students.sort_by(|a, b| {
            a.display_name()
                .cmp(&b.display_name())
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!("Discovered {} students", students.len());
        Ok(students)
    }

    /// Load a student from a specific directory
    async fn load_student_from_directory(
        &self,
        directory_name: &str,
    ) -> Result<Option<DomainStudent>> {
        let yaml_path = self.get_student_yaml_path(directory_name);

        if !yaml_path.exists() {
            return Ok(None);
        }

        let yaml_content = fs::read_to_string(&yaml_path)?;
        let yaml_student: YamlStudent = serde_yaml::from_str(&yaml_content)?;

        let domain_student = DomainStudent {
            id: yaml_student.id,
            name: yaml_student.name,
            first_name: yaml_student.first_name,
            last_name: yaml_student.last_name,
            phone: yaml_student.phone,
            email: yaml_student.email,
            billing_id: yaml_student.billing_id,
            lesson_link: yaml_student.lesson_link,
            created_at: chrono::DateTime::parse_from_rfc3339(&yaml_student.created_at)
                .context("Failed to parse created_at")?
                .with_timezone(&chrono::Utc),
            updated_at: chrono::DateTime::parse_from_rfc3339(&yaml_student.updated_at)
                .context("Failed to parse updated_at")?
                .with_timezone(&chrono::Utc),
        };

        Ok(Some(domain_student))
    }

    /// Save a student to their directory
    async fn save_student_to_directory(
        &self,
        student: &DomainStudent,
        directory_name: &str,
    ) -> Result<()> {
        let student_dir = self.connection.get_student_directory(directory_name);
        if !student_dir.exists() {
            fs::create_dir_all(&student_dir)?;
            info!("Created student directory: {:?}", student_dir);
        }

        let yaml_student = YamlStudent {
            id: student.id.clone(),
            name: student.name.clone(),
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            phone: student.phone.clone(),
            email: student.email.clone(),
            billing_id: student.billing_id.clone(),
            lesson_link: student.lesson_link.clone(),
            created_at: student.created_at.to_rfc3339(),
            updated_at: student.updated_at.to_rfc3339(),
        };

        let yaml_path = self.get_student_yaml_path(directory_name);
        let yaml_content = serde_yaml::to_string(&yaml_student)?;

        // Atomic write using temp file
        let temp_path = yaml_path.with_extension("tmp");
        fs::write(&temp_path, yaml_content)?;
        fs::rename(&temp_path, &yaml_path)?;

        info!("Saved student {} to directory: {}", student.name, directory_name);
        Ok(())
    }

    /// Find the directory name holding a student by ID.
    ///
    /// The fast path guesses the directory from the current display name;
    /// renames leave the directory under the old name, so a full scan backs
    /// it up.
    pub(crate) async fn find_directory_by_student_id(
        &self,
        student_id: &str,
    ) -> Result<Option<String>> {
        let students = self.discover_students().await?;
        if let Some(student) = students.iter().find(|s| s.id == student_id) {
            let guessed = Self::generate_safe_directory_name(&student.display_name());
            if let Ok(Some(loaded)) = self.load_student_from_directory(&guessed).await {
                if loaded.id == student_id {
                    return Ok(Some(guessed));
                }
            }
        }

        let base_dir = self.connection.base_directory();
        if !base_dir.exists() {
            return Ok(None);
        }

        for entry in fs::read_dir(base_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let dir_name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if let Ok(Some(loaded)) = self.load_student_from_directory(&dir_name).await {
                if loaded.id == student_id {
                    return Ok(Some(dir_name));
                }
            }
        }

        Ok(None)
    }

    /// Pick the directory for a new record. Display names are not unique, so
    /// a directory already owned by a different student gets the new ID's
    /// uuid appended instead of clobbering the existing record.
    async fn directory_name_for_new_student(&self, student: &DomainStudent) -> Result<String> {
        let base = Self::generate_safe_directory_name(&student.display_name());
        match self.load_student_from_directory(&base).await {
            Ok(Some(existing)) if existing.id != student.id => {
                let suffix = student.id.rsplit("::").next().unwrap_or(&student.id);
                Ok(format!("{}_{}", base, suffix))
            }
            _ => Ok(base),
        }
    }
}

#[async_trait]
impl crate::backend::storage::StudentStorage for StudentRepository {
    /// Store a new student
    async fn store_student(&self, student: &DomainStudent) -> Result<()> {
        let dir_name = self.directory_name_for_new_student(student).await?;
        self.save_student_to_directory(student, &dir_name).await
    }

    /// Retrieve a specific student by ID
    async fn get_student(&self, student_id: &str) -> Result<Option<DomainStudent>> {
        let students = self.discover_students().await?;
        Ok(students.into_iter().find(|s| s.id == student_id))
    }

    /// List all students ordered by display name
    async fn list_students(&self) -> Result<Vec<DomainStudent>> {
        self.discover_students().await
    }

    /// Update an existing student
    async fn update_student(&self, student: &DomainStudent) -> Result<()> {
        let dir_name = self
            .find_directory_by_student_id(&student.id)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!("Could not find directory for student ID: {}", student.id)
            })?;

        self.save_student_to_directory(student, &dir_name).await
    }

    /// Delete a student by ID, removing the directory with its lessons
    async fn delete_student(&self, student_id: &str) -> Result<()> {
        let directory_name = match self.find_directory_by_student_id(student_id).await? {
            Some(dir) => dir,
            None => return Err(anyhow::anyhow!("Student not found: {}", student_id)),
        };

        let student_dir = self.connection.get_student_directory(&directory_name);

        if student_dir.exists() {
            fs::remove_dir_all(&student_dir)?;
            info!("Deleted student directory: {:?}", student_dir);
        }

        Ok(())
    }
}
