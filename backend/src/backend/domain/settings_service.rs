//! Application settings domain logic.
//!
//! Holds the default calendar choice and the auto-sync flag for new lessons.
//! The record is created lazily with its defaults the first time anything
//! reads it, so a fresh data directory behaves sensibly without setup.

use anyhow::Result;
use log::info;
use std::sync::Arc;

use crate::backend::domain::models::settings::AppSettings;
use crate::backend::storage::{Connection, SettingsStorage};

/// Service for reading and updating application settings
#[derive(Clone)]
pub struct SettingsService<C: Connection> {
    settings_repository: C::SettingsRepository,
}

impl<C: Connection> SettingsService<C> {
    /// Create a new SettingsService
    pub fn new(connection: Arc<C>) -> Self {
        let settings_repository = connection.create_settings_repository();
        Self {
            settings_repository,
        }
    }

    /// Read the current settings, creating the default record on first use
    pub async fn get_settings(&self) -> Result<AppSettings> {
        self.settings_repository.get_settings().await
    }

    /// Apply a partial settings update. `None` fields are left as-is.
    pub async fn update_settings(
        &self,
        default_calendar_id: Option<String>,
        auto_sync_on_create: Option<bool>,
    ) -> Result<AppSettings> {
        let mut settings = self.settings_repository.get_settings().await?;

        if let Some(calendar_id) = default_calendar_id {
            settings.default_calendar_id = Some(calendar_id);
        }
        if let Some(auto_sync) = auto_sync_on_create {
            settings.auto_sync_on_create = auto_sync;
        }

        self.settings_repository.update_settings(&settings).await?;
        info!(
            "Updated settings: default_calendar_id={:?}, auto_sync_on_create={}",
            settings.default_calendar_id, settings.auto_sync_on_create
        );

        self.settings_repository.get_settings().await
    }

    /// Select the calendar new lesson events are filed into
    pub async fn set_default_calendar(&self, calendar_id: &str) -> Result<AppSettings> {
        if calendar_id.trim().is_empty() {
            return Err(anyhow::anyhow!("Calendar ID cannot be empty"));
        }

        self.update_settings(Some(calendar_id.trim().to_string()), None)
            .await
    }
}
