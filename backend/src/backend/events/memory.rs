//! Session-local in-memory event store.
//!
//! Keeps lesson events in a map for the lifetime of the process. Doubles as
//! the reconciler's test double: the authorization answer is fixed at
//! construction and individual operations can be switched to fail, which is
//! how denied-access and lost-event paths are exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::debug;
use uuid::Uuid;

use super::{CalendarEvent, EventCalendar, EventDraft, EventStore};

/// Calendar every event lands in unless a draft names another one
pub const LOCAL_CALENDAR_ID: &str = "local";

pub struct InMemoryEventStore {
    authorized: bool,
    calendars: Vec<EventCalendar>,
    events: Mutex<HashMap<String, CalendarEvent>>,
    fail_creates: AtomicBool,
    fail_updates: AtomicBool,
    fail_removals: AtomicBool,
    create_attempts: AtomicUsize,
    removal_attempts: AtomicUsize,
}

impl InMemoryEventStore {
    /// Authorized store with the single local calendar
    pub fn new() -> Self {
        Self::with_authorization(true)
    }

    /// Store with a fixed authorization answer
    pub fn with_authorization(authorized: bool) -> Self {
        Self {
            authorized,
            calendars: vec![EventCalendar {
                id: LOCAL_CALENDAR_ID.to_string(),
                title: "Lekcje".to_string(),
            }],
            events: Mutex::new(HashMap::new()),
            fail_creates: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
            fail_removals: AtomicBool::new(false),
            create_attempts: AtomicUsize::new(0),
            removal_attempts: AtomicUsize::new(0),
        }
    }

    /// Store offering the given calendars
    pub fn with_calendars(calendars: Vec<EventCalendar>) -> Self {
        Self {
            calendars,
            ..Self::with_authorization(true)
        }
    }

    /// Make every subsequent create fail
    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent update fail
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent removal fail
    pub fn set_fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    /// How many creates were attempted, failed ones included
    pub fn create_attempts(&self) -> usize {
        self.create_attempts.load(Ordering::SeqCst)
    }

    /// How many removals were attempted, failed ones included
    pub fn removal_attempts(&self) -> usize {
        self.removal_attempts.load(Ordering::SeqCst)
    }

    /// Snapshot of a stored event
    pub fn event(&self, event_id: &str) -> Option<CalendarEvent> {
        self.events.lock().unwrap().get(event_id).cloned()
    }

    /// Number of stored events
    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    fn resolve_calendar(&self, requested: Option<&str>) -> Option<String> {
        match requested {
            Some(id) => self
                .calendars
                .iter()
                .find(|calendar| calendar.id == id)
                .map(|calendar| calendar.id.clone()),
            None => self.calendars.first().map(|calendar| calendar.id.clone()),
        }
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn request_authorization(&self) -> bool {
        self.authorized
    }

    async fn list_calendars(&self) -> Vec<EventCalendar> {
        if !self.authorized {
            return vec![];
        }
        self.calendars.clone()
    }

    async fn create_event(&self, draft: &EventDraft) -> Option<String> {
        self.create_attempts.fetch_add(1, Ordering::SeqCst);

        if !self.authorized || self.fail_creates.load(Ordering::SeqCst) {
            return None;
        }

        let calendar_id = self.resolve_calendar(draft.calendar_id.as_deref())?;
        let event_id = format!("event::{}", Uuid::new_v4());
        let event = CalendarEvent {
            id: event_id.clone(),
            calendar_id,
            title: draft.title.clone(),
            notes: draft.notes.clone(),
            url: draft.url.clone(),
            start: draft.start,
            end: draft.end,
        };

        debug!("Stored calendar event {} ({})", event_id, event.title);
        self.events.lock().unwrap().insert(event_id.clone(), event);
        Some(event_id)
    }

    async fn update_event(&self, event_id: &str, draft: &EventDraft) -> bool {
        if !self.authorized || self.fail_updates.load(Ordering::SeqCst) {
            return false;
        }

        let mut events = self.events.lock().unwrap();
        match events.get_mut(event_id) {
            Some(event) => {
                // The event stays in its calendar; drafts only rewrite content.
                event.title = draft.title.clone();
                event.notes = draft.notes.clone();
                event.url = draft.url.clone();
                event.start = draft.start;
                event.end = draft.end;
                true
            }
            None => false,
        }
    }

    async fn remove_event(&self, event_id: &str) -> bool {
        self.removal_attempts.fetch_add(1, Ordering::SeqCst);

        if !self.authorized || self.fail_removals.load(Ordering::SeqCst) {
            return false;
        }

        self.events.lock().unwrap().remove(event_id).is_some()
    }

    async fn events_in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        calendar_id: Option<&str>,
    ) -> Vec<CalendarEvent> {
        if !self.authorized {
            return vec![];
        }

        let events = self.events.lock().unwrap();
        let mut found: Vec<CalendarEvent> = events
            .values()
            .filter(|event| event.start < end && event.end > start)
            .filter(|event| calendar_id.map_or(true, |id| event.calendar_id == id))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        found
    }
}
