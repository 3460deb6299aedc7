//! # Backend Module
//!
//! Contains all non-UI logic for the lesson tracker application.
//!
//! This module serves as the orchestration layer that brings together:
//! - **Domain**: Business logic and rules for students, lessons and billing
//! - **Storage**: Data persistence over per-student CSV/YAML files
//! - **Events**: The external calendar store lesson events are filed into
//! - **IO**: Interface layer that exposes functionality to the UI
//!
//! The backend is designed to be UI-agnostic, meaning it could theoretically
//! support different frontend frameworks or even CLI interfaces without
//! modification.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! ```text
//! UI Layer (HTTP clients)
//!     ↓
//! IO Layer (REST API, handlers, DTO mappers)
//!     ↓
//! Domain Layer (Business logic, services)
//!     ↓
//! Storage Layer (CSV/YAML files) + Events (external calendar)
//! ```
//!
//! ## Key Responsibilities
//!
//! - Initialize and configure the application state
//! - Set up the REST API router with proper CORS configuration
//! - Coordinate between domain logic, data persistence and the calendar
//! - Provide a clean separation of concerns for maintainability

pub mod domain;
pub mod events;
pub mod io;
pub mod storage;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use log::info;
use tower_http::cors::{Any, CorsLayer};

pub use crate::backend::domain::{
    CalendarService, CalendarSyncService, ExportService, LessonService, ReportService,
    SettingsService, StudentService,
};
pub use crate::backend::events::{EventStore, InMemoryEventStore};
pub use crate::backend::storage::csv::CsvConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub student_service: StudentService<CsvConnection>,
    pub lesson_service: LessonService<CsvConnection>,
    pub calendar_service: CalendarService,
    pub report_service: ReportService<CsvConnection>,
    pub export_service: ExportService,
    pub sync_service: CalendarSyncService<CsvConnection>,
    pub settings_service: SettingsService<CsvConnection>,
}

/// Initialize the backend in the default data directory with the in-memory
/// calendar store
pub async fn initialize_backend() -> Result<AppState> {
    info!("Setting up storage");
    let connection = CsvConnection::new_default()?;

    initialize_backend_with(connection, Arc::new(InMemoryEventStore::new()), None).await
}

/// Initialize the backend with explicit collaborators.
///
/// `export_directory` overrides where report exports land; `None` keeps the
/// system temp directory.
pub async fn initialize_backend_with(
    connection: CsvConnection,
    event_store: Arc<dyn EventStore>,
    export_directory: Option<PathBuf>,
) -> Result<AppState> {
    let connection = Arc::new(connection);

    info!("Setting up domain model");
    let settings_service = SettingsService::new(connection.clone());
    let sync_service = CalendarSyncService::new(event_store, settings_service.clone());
    let student_service = StudentService::new(connection.clone(), sync_service.clone());
    let lesson_service = LessonService::new(
        connection.clone(),
        sync_service.clone(),
        settings_service.clone(),
    );
    let calendar_service = CalendarService::new();
    let report_service = ReportService::new(connection.clone());
    let export_service = match export_directory {
        Some(directory) => ExportService::with_export_directory(directory),
        None => ExportService::new(),
    };

    info!("Setting up application state");
    let app_state = AppState {
        student_service,
        lesson_service,
        calendar_service,
        report_service,
        export_service,
        sync_service,
        settings_service,
    };

    Ok(app_state)
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    // CORS setup to allow frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    // Set up our application routes
    let api_routes = Router::new()
        .nest("/students", io::rest::student_apis::router())
        .nest("/lessons", io::rest::lesson_apis::router())
        .nest("/calendar", io::rest::calendar_apis::router())
        .nest("/reports", io::rest::report_apis::router())
        .nest("/settings", io::rest::settings_apis::router());

    // Define our main application router
    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    //! Shared wiring for the REST API tests: a full backend over a temp data
    //! directory, an authorized in-memory event store and seed helpers.

    use std::path::PathBuf;
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::{initialize_backend_with, AppState};
    use crate::backend::domain::commands::lessons::CreateLessonCommand;
    use crate::backend::domain::commands::students::CreateStudentCommand;
    use crate::backend::domain::models::{Lesson, Student};
    use crate::backend::events::InMemoryEventStore;
    use crate::backend::storage::csv::CsvConnection;

    pub struct TestApp {
        pub state: AppState,
        pub store: Arc<InMemoryEventStore>,
        pub export_dir: PathBuf,
        pub _temp_dir: TempDir,
    }

    pub async fn test_app() -> TestApp {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let connection = CsvConnection::new(temp_dir.path()).expect("Failed to create connection");
        let store = Arc::new(InMemoryEventStore::new());
        let export_dir = temp_dir.path().join("exports");

        let state = initialize_backend_with(connection, store.clone(), Some(export_dir.clone()))
            .await
            .expect("Failed to initialize backend");

        TestApp {
            state,
            store,
            export_dir,
            _temp_dir: temp_dir,
        }
    }

    /// Store a student through the domain service
    pub async fn seed_student(state: &AppState, name: &str, billing_id: Option<&str>) -> Student {
        state
            .student_service
            .create_student(CreateStudentCommand {
                name: name.to_string(),
                first_name: None,
                last_name: None,
                phone: None,
                email: None,
                billing_id: billing_id.map(|id| id.to_string()),
                lesson_link: None,
            })
            .await
            .expect("Failed to seed student")
            .student
    }

    /// Store a lesson through the domain service, skipping calendar sync
    pub async fn seed_lesson(
        state: &AppState,
        student_id: &str,
        date: &str,
        duration_hours: f64,
        hourly_rate: f64,
    ) -> Lesson {
        state
            .lesson_service
            .create_lesson(CreateLessonCommand {
                student_id: student_id.to_string(),
                date: date.to_string(),
                duration_hours,
                hourly_rate,
                paid: None,
                notes: None,
                add_to_calendar: Some(false),
            })
            .await
            .expect("Failed to seed lesson")
            .lesson
    }
}
