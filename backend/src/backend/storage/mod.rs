//! # Storage Module
//!
//! Persistence layer for the lesson tracker. The domain services only see the
//! traits defined in [`traits`]; the concrete implementation is the CSV/YAML
//! file store in [`csv`]. The `Connection` trait ties the two together: a
//! connection knows how to hand out repository instances for students,
//! lessons and settings, and services are generic over it so tests can run
//! against a temp directory.

pub mod csv;
pub mod traits;

pub use traits::{Connection, LessonStorage, SettingsStorage, StudentStorage};
