//! Process-wide preference record.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Preferences stored once per data directory in `settings.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// External calendar lesson events are filed into; None until picked
    pub default_calendar_id: Option<String>,
    /// Whether freshly created lessons are synced without being asked
    pub auto_sync_on_create: bool,
    /// Version of the on-disk data format
    pub data_format_version: String,
    /// RFC 3339 timestamp of record creation
    pub created_at: String,
    /// RFC 3339 timestamp of the last change
    pub updated_at: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            default_calendar_id: None,
            auto_sync_on_create: true,
            data_format_version: "1.0".to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.default_calendar_id, None);
        assert!(settings.auto_sync_on_create);
        assert_eq!(settings.data_format_version, "1.0");
    }
}
