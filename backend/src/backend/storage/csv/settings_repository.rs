//! # Settings Repository
//!
//! File-based application settings storage using a single YAML file
//! `settings.yaml` at the root of the data directory.
//!
//! ## File Structure
//!
//! ```text
//! Lesson Tracker/
//! ├── settings.yaml         ← This module manages this file
//! └── {student_name}/
//!     ├── student.yaml
//!     └── lessons.csv
//! ```
//!
//! ## YAML Format
//!
//! ```yaml
//! default_calendar_id: "calendar-id"
//! auto_sync_on_create: true
//! data_format_version: "1.0"
//! created_at: "2025-01-21T19:30:00Z"
//! updated_at: "2025-01-21T19:35:00Z"
//! ```

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use std::fs;
use std::path::PathBuf;

use super::connection::CsvConnection;
use crate::backend::domain::models::settings::AppSettings;

/// YAML-backed settings repository
#[derive(Clone)]
pub struct SettingsRepository {
    connection: CsvConnection,
}

impl SettingsRepository {
    /// Create a new settings repository
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Get the settings file path
    fn get_settings_path(&self) -> PathBuf {
        self.connection.base_directory().join("settings.yaml")
    }

    /// Load settings from file, creating the default record if it doesn't exist
    fn load_or_create_settings(&self) -> Result<AppSettings> {
        let settings_path = self.get_settings_path();

        if settings_path.exists() {
            let yaml_content = fs::read_to_string(&settings_path)?;
            let settings: AppSettings = serde_yaml::from_str(&yaml_content)?;
            debug!("Loaded settings from {:?}", settings_path);
            Ok(settings)
        } else {
            let settings = AppSettings::default();
            self.save_settings(&settings)?;
            info!("Created default settings at {:?}", settings_path);
            Ok(settings)
        }
    }

    /// Save settings to file
    fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        let settings_path = self.get_settings_path();
        let base_dir = self.connection.base_directory();

        if !base_dir.exists() {
            fs::create_dir_all(&base_dir)?;
            info!("Created base data directory: {:?}", base_dir);
        }

        let yaml_content = serde_yaml::to_string(settings)?;

        // Atomic write pattern: write to temp file, then rename
        let temp_path = settings_path.with_extension("tmp");
        fs::write(&temp_path, yaml_content)?;
        fs::rename(&temp_path, &settings_path)?;

        debug!("Saved settings to {:?}", settings_path);
        Ok(())
    }
}

#[async_trait]
impl crate::backend::storage::SettingsStorage for SettingsRepository {
    async fn get_settings(&self) -> Result<AppSettings> {
        self.load_or_create_settings()
    }

    async fn update_settings(&self, settings: &AppSettings) -> Result<()> {
        let mut updated = settings.clone();
        updated.updated_at = Utc::now().to_rfc3339();

        self.save_settings(&updated)?;
        info!("Updated application settings");
        Ok(())
    }
}
