//! # REST API Interface Layer
//!
//! Provides HTTP REST endpoints for the lesson tracker application.
//! This layer handles:
//! - HTTP request/response serialization and deserialization
//! - Input validation and sanitization
//! - Error translation from domain to HTTP status codes
//! - Request logging and monitoring
//!
//! ## Key Responsibilities
//!
//! - **API Endpoints**: RESTful HTTP interfaces for all operations
//! - **Error Handling**: Converting domain errors to proper HTTP responses
//! - **Serialization**: JSON request/response handling
//! - **DTO Mapping**: Translating between the `shared` wire types and the
//!   domain models via `mappers`
//! - **Logging**: Request/response logging for debugging and monitoring
//!
//! ## Error Translation
//!
//! Handlers answer 400 for rejected input (`ValidationError`), 404 when the
//! addressed record does not exist, and 500 for storage failures. Calendar
//! failures never surface as HTTP errors; the response body carries the
//! resulting sync state instead.

pub mod calendar_apis;
pub mod lesson_apis;
pub mod mappers;
pub mod report_apis;
pub mod settings_apis;
pub mod student_apis;
