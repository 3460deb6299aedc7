//! # Events Module
//!
//! Boundary to the external calendar store lesson events are filed into.
//! Everything behind `EventStore` speaks in opaque event-id strings and
//! boolean/Option outcomes: a denied authorization or a failed save is a
//! state the reconciler works around, never an error that propagates.
//!
//! The shipped implementation is the in-memory store in `memory`; a host-OS
//! calendar binding would implement the same trait.

use async_trait::async_trait;
use chrono::NaiveDateTime;

pub mod memory;

pub use memory::InMemoryEventStore;

/// A writable calendar in the external store
#[derive(Debug, Clone, PartialEq)]
pub struct EventCalendar {
    pub id: String,
    pub title: String,
}

/// Payload for creating or rewriting a lesson event
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    /// Target calendar; None lets the store pick its default
    pub calendar_id: Option<String>,
    pub title: String,
    pub notes: Option<String>,
    pub url: Option<String>,
    /// Start instant, local wall clock
    pub start: NaiveDateTime,
    /// End instant, local wall clock
    pub end: NaiveDateTime,
    /// Reminder offset before the start, when the store supports alarms
    pub reminder_minutes_before: Option<i64>,
}

/// An event as it currently exists in the external store
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub calendar_id: String,
    pub title: String,
    pub notes: Option<String>,
    pub url: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Async boundary to the external calendar store
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Ask the host for calendar access. Callers cache the answer for the
    /// session; the store may be asked repeatedly and must stay consistent.
    async fn request_authorization(&self) -> bool;

    /// Writable calendars, empty when access is not granted
    async fn list_calendars(&self) -> Vec<EventCalendar>;

    /// Save a new event. Returns its id, or None when the save failed.
    async fn create_event(&self, draft: &EventDraft) -> Option<String>;

    /// Rewrite an existing event. False when the event is gone or the save
    /// failed.
    async fn update_event(&self, event_id: &str, draft: &EventDraft) -> bool;

    /// Remove an event. False when the event is gone or the removal failed.
    async fn remove_event(&self, event_id: &str) -> bool;

    /// Events overlapping `[start, end)`, optionally restricted to one
    /// calendar, ordered by start instant.
    async fn events_in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        calendar_id: Option<&str>,
    ) -> Vec<CalendarEvent>;
}
