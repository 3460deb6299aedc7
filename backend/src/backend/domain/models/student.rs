//! Student domain model.
//!
//! A student is the billing anchor of the app: lessons belong to exactly one
//! student, and monthly reports cluster students by their billing ID. All
//! display fallbacks (full name, display name, initials) live here so every
//! layer renders the same strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Core student entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Unique identifier ("student::<uuid-v4>")
    pub id: String,
    /// Required display name, non-empty once validated
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Students sharing a billing ID land on one invoice
    pub billing_id: Option<String>,
    /// Video call URL reused for every lesson of this student
    pub lesson_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Generate a new student ID
    pub fn generate_id() -> String {
        format!("student::{}", Uuid::new_v4())
    }

    /// First and last name joined when both are present, else whichever one
    /// is, else the raw `name`.
    pub fn full_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        if !first.is_empty() && !last.is_empty() {
            format!("{} {}", first, last)
        } else if !first.is_empty() {
            first.to_string()
        } else if !last.is_empty() {
            last.to_string()
        } else {
            self.name.clone()
        }
    }

    /// Name used in headers, sorting and calendar event titles
    pub fn display_name(&self) -> String {
        let full = self.full_name();
        if full.is_empty() {
            self.name.clone()
        } else {
            full
        }
    }

    /// One or two characters for avatar badges
    pub fn initials(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        match (first.chars().next(), last.chars().next()) {
            (Some(f), Some(l)) => format!("{}{}", f, l).to_uppercase(),
            _ => match self.name.trim().chars().next() {
                Some(c) => c.to_uppercase().to_string(),
                None => "?".to_string(),
            },
        }
    }

    /// Key this student is billed under: the billing ID when set, otherwise
    /// the display name. "Brak ID" is the last resort for a blank record.
    pub fn billing_key(&self) -> String {
        match self.billing_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let name = self.display_name();
                if name.is_empty() {
                    "Brak ID".to_string()
                } else {
                    name
                }
            }
        }
    }
}
