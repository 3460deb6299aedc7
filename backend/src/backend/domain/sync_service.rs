//! Calendar sync reconciliation for lessons.
//!
//! Keeps each lesson's external calendar event in step with the stored
//! record. Every operation here reports an outcome instead of an error: a
//! refused authorization, a vanished event or a failing store must never
//! abort the lesson write that triggered the sync. The caller records the
//! outcome on the lesson (`calendar_event_id`, `synced_with_calendar`) and
//! moves on.
//!
//! Authorization is requested from the event store once per process and the
//! answer is cached, matching how desktop calendar permissions behave.

use chrono::{Duration, Local};
use log::{info, warn};
use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::backend::domain::models::lesson::Lesson;
use crate::backend::domain::models::student::Student;
use crate::backend::domain::settings_service::SettingsService;
use crate::backend::events::{CalendarEvent, EventCalendar, EventDraft, EventStore};
use crate::backend::storage::Connection;

/// Lesson events are recognized in the external calendar by this marker
pub const LESSON_TITLE_MARKER: &str = "Lekcja";

/// Reminder offset applied to every lesson event
const REMINDER_MINUTES_BEFORE: i64 = 15;

/// Service reconciling lessons with the external calendar store
#[derive(Clone)]
pub struct CalendarSyncService<C: Connection> {
    event_store: Arc<dyn EventStore>,
    settings_service: SettingsService<C>,
    /// Cached authorization answer, filled on first use
    authorization: Arc<OnceCell<bool>>,
}

impl<C: Connection> CalendarSyncService<C> {
    /// Create a new CalendarSyncService
    pub fn new(event_store: Arc<dyn EventStore>, settings_service: SettingsService<C>) -> Self {
        Self {
            event_store,
            settings_service,
            authorization: Arc::new(OnceCell::new()),
        }
    }

    /// Request calendar access once and cache the answer for the process
    pub async fn ensure_authorized(&self) -> bool {
        if let Some(authorized) = self.authorization.get() {
            return *authorized;
        }

        let authorized = self.event_store.request_authorization().await;
        if authorized {
            info!("📅 Calendar access granted");
        } else {
            warn!("📅 Calendar access denied, lessons will not be synced");
        }

        // A racing fill stores the same answer, so the result can be ignored
        let _ = self.authorization.set(authorized);
        authorized
    }

    /// List the writable calendars together with the authorization state
    pub async fn list_calendars(&self) -> (bool, Vec<EventCalendar>) {
        if !self.ensure_authorized().await {
            return (false, Vec::new());
        }
        (true, self.event_store.list_calendars().await)
    }

    /// Calendar new lesson events are filed into: the configured one when it
    /// still exists, otherwise the first available.
    pub async fn default_calendar_id(&self) -> Option<String> {
        let stored = match self.settings_service.get_settings().await {
            Ok(settings) => settings.default_calendar_id,
            Err(e) => {
                warn!("Could not read settings for calendar choice: {}", e);
                None
            }
        };

        let calendars = self.event_store.list_calendars().await;
        if let Some(id) = stored {
            if calendars.iter().any(|c| c.id == id) {
                return Some(id);
            }
            warn!("Configured calendar '{}' no longer exists, falling back", id);
        }

        calendars.first().map(|c| c.id.clone())
    }

    /// Build the event payload for a lesson
    fn build_event_draft(
        student: &Student,
        lesson: &Lesson,
        calendar_id: Option<String>,
    ) -> EventDraft {
        let link = student
            .lesson_link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());

        let mut note_lines = Vec::new();
        if let Some(link) = link {
            note_lines.push(format!("Link do zajęć: {}", link));
        }
        if let Some(notes) = lesson.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            note_lines.push(notes.to_string());
        }

        EventDraft {
            calendar_id,
            title: format!("{}: {}", LESSON_TITLE_MARKER, student.display_name()),
            notes: if note_lines.is_empty() {
                None
            } else {
                Some(note_lines.join("\n"))
            },
            url: link.map(str::to_string),
            start: lesson.date,
            end: lesson.end_date(),
            reminder_minutes_before: Some(REMINDER_MINUTES_BEFORE),
        }
    }

    /// Create an event for a fresh lesson. Returns the event id, or None when
    /// access is denied or the save fails.
    pub async fn on_lesson_created(&self, student: &Student, lesson: &Lesson) -> Option<String> {
        if !self.ensure_authorized().await {
            info!("Skipping calendar sync for lesson {}: not authorized", lesson.id);
            return None;
        }

        let calendar_id = self.default_calendar_id().await;
        let draft = Self::build_event_draft(student, lesson, calendar_id);

        match self.event_store.create_event(&draft).await {
            Some(event_id) => {
                info!("📅 Created calendar event {} for lesson {}", event_id, lesson.id);
                Some(event_id)
            }
            None => {
                warn!("📅 Calendar event creation failed for lesson {}", lesson.id);
                None
            }
        }
    }

    /// Bring the external event in line with the lesson after an edit.
    ///
    /// A synced lesson gets its event rewritten in place; when the rewrite
    /// fails (the event was deleted externally, or the store refuses) a fresh
    /// event is created instead. An unsynced lesson goes straight to
    /// creation. Returns the id of the event now backing the lesson.
    pub async fn on_lesson_updated(&self, student: &Student, lesson: &Lesson) -> Option<String> {
        if !self.ensure_authorized().await {
            info!("Skipping calendar sync for lesson {}: not authorized", lesson.id);
            return None;
        }

        let calendar_id = self.default_calendar_id().await;
        let draft = Self::build_event_draft(student, lesson, calendar_id);

        if lesson.synced_with_calendar {
            if let Some(event_id) = &lesson.calendar_event_id {
                if self.event_store.update_event(event_id, &draft).await {
                    info!("📅 Updated calendar event {} for lesson {}", event_id, lesson.id);
                    return Some(event_id.clone());
                }
                warn!(
                    "📅 Calendar event {} missing or stale for lesson {}, recreating",
                    event_id, lesson.id
                );
            }
        }

        match self.event_store.create_event(&draft).await {
            Some(event_id) => {
                info!("📅 Created calendar event {} for lesson {}", event_id, lesson.id);
                Some(event_id)
            }
            None => {
                warn!("📅 Calendar event creation failed for lesson {}", lesson.id);
                None
            }
        }
    }

    /// Remove the event of a deleted lesson. Only synced lessons reach the
    /// store; the outcome is recorded, never surfaced as an error.
    pub async fn on_lesson_deleted(&self, lesson: &Lesson) -> bool {
        if !lesson.synced_with_calendar {
            return false;
        }

        let Some(event_id) = &lesson.calendar_event_id else {
            return false;
        };

        let removed = self.event_store.remove_event(event_id).await;
        if removed {
            info!("📅 Removed calendar event {} for lesson {}", event_id, lesson.id);
        } else {
            warn!(
                "📅 Could not remove calendar event {} for lesson {}",
                event_id, lesson.id
            );
        }
        removed
    }

    /// Explicit sync request for one lesson, shared with the edit path
    pub async fn sync_now(&self, student: &Student, lesson: &Lesson) -> Option<String> {
        self.on_lesson_updated(student, lesson).await
    }

    /// Detach a lesson from its event, removing the event when possible
    pub async fn unsync(&self, lesson: &Lesson) -> bool {
        let Some(event_id) = &lesson.calendar_event_id else {
            return false;
        };

        let removed = self.event_store.remove_event(event_id).await;
        if removed {
            info!("📅 Removed calendar event {} while unsyncing lesson {}", event_id, lesson.id);
        } else {
            warn!(
                "📅 Calendar event {} could not be removed while unsyncing lesson {}",
                event_id, lesson.id
            );
        }
        removed
    }

    /// Lesson events in the default calendar over the next `days_ahead` days
    pub async fn upcoming_lesson_events(&self, days_ahead: i64) -> Vec<CalendarEvent> {
        if !self.ensure_authorized().await {
            return Vec::new();
        }

        let now = Local::now().naive_local();
        let end = now + Duration::days(days_ahead);
        let calendar_id = self.default_calendar_id().await;

        self.event_store
            .events_in_range(now, end, calendar_id.as_deref())
            .await
            .into_iter()
            .filter(|event| event.title.contains(LESSON_TITLE_MARKER))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::events::InMemoryEventStore;
    use crate::backend::storage::csv::CsvConnection;
    use chrono::{NaiveDate, NaiveDateTime, Utc};
    use tempfile::TempDir;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn make_student(name: &str, lesson_link: Option<&str>) -> Student {
        let now = Utc::now();
        Student {
            id: Student::generate_id(),
            name: name.to_string(),
            first_name: None,
            last_name: None,
            phone: None,
            email: None,
            billing_id: None,
            lesson_link: lesson_link.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn make_lesson(date: NaiveDateTime) -> Lesson {
        Lesson {
            id: Lesson::generate_id(),
            student_id: "student::test".to_string(),
            date,
            duration_hours: 1.5,
            hourly_rate: 60.0,
            paid: false,
            notes: None,
            calendar_event_id: None,
            synced_with_calendar: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn setup_with_store(
        store: InMemoryEventStore,
    ) -> (CalendarSyncService<CsvConnection>, Arc<InMemoryEventStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connection = Arc::new(CsvConnection::new(temp_dir.path()).unwrap());
        let settings_service = SettingsService::new(connection);
        let store = Arc::new(store);
        let service = CalendarSyncService::new(store.clone(), settings_service);
        (service, store, temp_dir)
    }

    #[tokio::test]
    async fn test_created_lesson_gets_event_with_draft_fields() {
        let (service, store, _temp_dir) = setup_with_store(InMemoryEventStore::new());

        let student = make_student("Anna Nowak", Some("https://meet.example/anna"));
        let mut lesson = make_lesson(dt(2025, 3, 3, 10, 0));
        lesson.notes = Some("Równania kwadratowe".to_string());

        let event_id = service.on_lesson_created(&student, &lesson).await;
        assert!(event_id.is_some());

        let event = store.event(&event_id.unwrap()).unwrap();
        assert_eq!(event.title, "Lekcja: Anna Nowak");
        assert_eq!(
            event.notes.as_deref(),
            Some("Link do zajęć: https://meet.example/anna\nRównania kwadratowe")
        );
        assert_eq!(event.url.as_deref(), Some("https://meet.example/anna"));
        assert_eq!(event.start, dt(2025, 3, 3, 10, 0));
        assert_eq!(event.end, dt(2025, 3, 3, 11, 30));
    }

    #[tokio::test]
    async fn test_no_link_means_no_notes_and_no_url() {
        let (service, store, _temp_dir) = setup_with_store(InMemoryEventStore::new());

        let student = make_student("Anna Nowak", None);
        let lesson = make_lesson(dt(2025, 3, 3, 10, 0));

        let event_id = service.on_lesson_created(&student, &lesson).await.unwrap();
        let event = store.event(&event_id).unwrap();
        assert_eq!(event.notes, None);
        assert_eq!(event.url, None);
    }

    #[tokio::test]
    async fn test_denied_authorization_skips_creation() {
        let (service, store, _temp_dir) =
            setup_with_store(InMemoryEventStore::with_authorization(false));

        let student = make_student("Anna Nowak", None);
        let lesson = make_lesson(dt(2025, 3, 3, 10, 0));

        assert_eq!(service.on_lesson_created(&student, &lesson).await, None);
        assert!(!service.ensure_authorized().await);
        // The gate sits in front of the store, so nothing was attempted
        assert_eq!(store.create_attempts(), 0);
    }

    #[tokio::test]
    async fn test_update_keeps_existing_event_id() {
        let (service, _store, _temp_dir) = setup_with_store(InMemoryEventStore::new());

        let student = make_student("Anna Nowak", None);
        let mut lesson = make_lesson(dt(2025, 3, 3, 10, 0));

        let event_id = service.on_lesson_created(&student, &lesson).await.unwrap();
        lesson.calendar_event_id = Some(event_id.clone());
        lesson.synced_with_calendar = true;
        lesson.date = dt(2025, 3, 4, 10, 0);

        let after = service.on_lesson_updated(&student, &lesson).await;
        assert_eq!(after, Some(event_id));
    }

    #[tokio::test]
    async fn test_update_falls_back_to_creation_when_event_is_gone() {
        let (service, store, _temp_dir) = setup_with_store(InMemoryEventStore::new());

        let student = make_student("Anna Nowak", None);
        let mut lesson = make_lesson(dt(2025, 3, 3, 10, 0));
        lesson.calendar_event_id = Some("event::vanished".to_string());
        lesson.synced_with_calendar = true;

        let after = service.on_lesson_updated(&student, &lesson).await;
        assert!(after.is_some());
        assert_ne!(after.as_deref(), Some("event::vanished"));
        assert!(store.event(after.as_deref().unwrap()).is_some());
    }

    #[tokio::test]
    async fn test_update_failure_falls_back_even_when_event_exists() {
        let (service, store, _temp_dir) = setup_with_store(InMemoryEventStore::new());

        let student = make_student("Anna Nowak", None);
        let mut lesson = make_lesson(dt(2025, 3, 3, 10, 0));
        let event_id = service.on_lesson_created(&student, &lesson).await.unwrap();
        lesson.calendar_event_id = Some(event_id.clone());
        lesson.synced_with_calendar = true;

        // The store refuses the rewrite, so a replacement event is created
        store.set_fail_updates(true);
        let after = service.on_lesson_updated(&student, &lesson).await;
        assert!(after.is_some());
        assert_ne!(after, Some(event_id));
    }

    #[tokio::test]
    async fn test_update_with_all_operations_failing_reports_none() {
        let (service, store, _temp_dir) = setup_with_store(InMemoryEventStore::new());

        let student = make_student("Anna Nowak", None);
        let mut lesson = make_lesson(dt(2025, 3, 3, 10, 0));
        let event_id = service.on_lesson_created(&student, &lesson).await.unwrap();
        lesson.calendar_event_id = Some(event_id);
        lesson.synced_with_calendar = true;

        store.set_fail_updates(true);
        store.set_fail_creates(true);
        assert_eq!(service.on_lesson_updated(&student, &lesson).await, None);
    }

    #[tokio::test]
    async fn test_unsynced_lesson_update_creates_event() {
        let (service, store, _temp_dir) = setup_with_store(InMemoryEventStore::new());

        let student = make_student("Anna Nowak", None);
        let lesson = make_lesson(dt(2025, 3, 3, 10, 0));

        let event_id = service.on_lesson_updated(&student, &lesson).await;
        assert!(event_id.is_some());
        assert_eq!(store.create_attempts(), 1);
    }

    #[tokio::test]
    async fn test_delete_only_touches_store_for_synced_lessons() {
        let (service, store, _temp_dir) = setup_with_store(InMemoryEventStore::new());

        let unsynced = make_lesson(dt(2025, 3, 3, 10, 0));
        assert!(!service.on_lesson_deleted(&unsynced).await);
        assert_eq!(store.removal_attempts(), 0);

        let student = make_student("Anna Nowak", None);
        let mut synced = make_lesson(dt(2025, 3, 4, 10, 0));
        let event_id = service.on_lesson_created(&student, &synced).await.unwrap();
        synced.calendar_event_id = Some(event_id);
        synced.synced_with_calendar = true;

        assert!(service.on_lesson_deleted(&synced).await);
        assert_eq!(store.removal_attempts(), 1);
    }

    #[tokio::test]
    async fn test_failed_removal_reports_false_after_one_attempt() {
        let (service, store, _temp_dir) = setup_with_store(InMemoryEventStore::new());

        let student = make_student("Anna Nowak", None);
        let mut lesson = make_lesson(dt(2025, 3, 3, 10, 0));
        let event_id = service.on_lesson_created(&student, &lesson).await.unwrap();
        lesson.calendar_event_id = Some(event_id);
        lesson.synced_with_calendar = true;

        store.set_fail_removals(true);
        assert!(!service.on_lesson_deleted(&lesson).await);
        assert_eq!(store.removal_attempts(), 1);
    }

    #[tokio::test]
    async fn test_upcoming_events_filters_foreign_titles() {
        let (service, store, _temp_dir) = setup_with_store(InMemoryEventStore::new());

        let student = make_student("Anna Nowak", None);
        let tomorrow = Local::now().naive_local() + Duration::days(1);
        service.on_lesson_created(&student, &make_lesson(tomorrow)).await;

        // A non-lesson event in the same window must not show up
        let foreign = EventDraft {
            calendar_id: None,
            title: "Dentysta".to_string(),
            notes: None,
            url: None,
            start: tomorrow,
            end: tomorrow + Duration::hours(1),
            reminder_minutes_before: None,
        };
        store.create_event(&foreign).await.unwrap();

        let events = service.upcoming_lesson_events(7).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Lekcja: Anna Nowak");
    }

    #[tokio::test]
    async fn test_stored_calendar_choice_wins_while_it_exists() {
        let calendars = vec![
            EventCalendar {
                id: "personal".to_string(),
                title: "Prywatny".to_string(),
            },
            EventCalendar {
                id: "work".to_string(),
                title: "Korepetycje".to_string(),
            },
        ];
        let (service, _store, _temp_dir) =
            setup_with_store(InMemoryEventStore::with_calendars(calendars));

        // No choice stored yet: first available wins
        assert_eq!(service.default_calendar_id().await.as_deref(), Some("personal"));

        service
            .settings_service
            .set_default_calendar("work")
            .await
            .unwrap();
        assert_eq!(service.default_calendar_id().await.as_deref(), Some("work"));

        // A stale stored id falls back to the first available
        service
            .settings_service
            .set_default_calendar("deleted")
            .await
            .unwrap();
        assert_eq!(service.default_calendar_id().await.as_deref(), Some("personal"));
    }
}
