//! # Domain Module
//!
//! Contains all business logic for the lesson tracker.
//!
//! This module encapsulates the core business rules, entities, and services
//! that define how students, lessons, and their billing are modeled. It
//! operates independently of any specific transport or storage mechanism.
//!
//! ## Module Organization
//!
//! - **student_service**: Student CRUD, detail aggregates and the cascading delete
//! - **lesson_service**: Lesson CRUD, payment toggling and the calendar hooks
//! - **sync_service**: Reconciliation between lessons and external calendar events
//! - **report_service**: Monthly billing aggregation and CSV rendering
//! - **export_service**: Writing rendered reports to disk
//! - **calendar**: Month/week/day grid generation and focus navigation
//! - **settings_service**: Process-wide preferences
//! - **commands**: Internal command and result types the services speak
//! - **models**: Core entities shared by every layer
//!
//! ## Core Concepts
//!
//! - **Student**: The billing anchor; every lesson belongs to exactly one
//! - **Lesson**: A scheduled block of tutoring with duration, rate and payment state
//! - **Billing group**: Students sharing a billing ID, invoiced together
//! - **Sync state**: The lesson's link to its external calendar event
//!
//! ## Business Rules
//!
//! - Student names are required and bounded; lessons need a positive duration
//!   and a non-negative rate
//! - Lesson and student writes always succeed independently of the calendar;
//!   sync failures are recorded on the lesson, never raised
//! - Monthly reports are deterministic: identical data renders to identical bytes
//! - Deleting a student removes its lessons one by one, calendar event first

pub mod calendar;
pub mod commands;
pub mod export_service;
pub mod lesson_service;
pub mod models;
pub mod report_service;
pub mod settings_service;
pub mod student_service;
pub mod sync_service;

pub use calendar::*;
pub use commands::*;
pub use export_service::*;
pub use lesson_service::*;
pub use report_service::*;
pub use settings_service::*;
pub use student_service::*;
pub use sync_service::*;
