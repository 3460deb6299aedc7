//! # REST API for Lesson Management
//!
//! Endpoints for the lesson lifecycle: CRUD, the paid toggle and the manual
//! calendar sync/unsync operations. Calendar failures never fail these
//! endpoints; the response carries the resulting sync state instead.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::Local;
use log::{error, info};
use serde::Deserialize;

use crate::backend::domain::commands::lessons::LessonListQuery;
use crate::backend::domain::models::validation::ValidationError;
use crate::backend::io::rest::mappers::lesson_mapper::LessonMapper;
use crate::backend::AppState;
use shared::{CreateLessonRequest, UpdateLessonRequest};

// Query parameters for the lesson listing API
#[derive(Debug, Deserialize)]
pub struct LessonListParams {
    pub student_id: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Create a router for lesson related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_lessons).post(create_lesson))
        .route(
            "/:lesson_id",
            get(get_lesson).put(update_lesson).delete(delete_lesson),
        )
        .route("/:lesson_id/toggle-paid", post(toggle_paid))
        .route("/:lesson_id/sync", post(sync_lesson))
        .route("/:lesson_id/unsync", post(unsync_lesson))
}

/// Create a new lesson, syncing it to the calendar per the request override
/// or the configured default
async fn create_lesson(
    State(state): State<AppState>,
    Json(request): Json<CreateLessonRequest>,
) -> impl IntoResponse {
    info!("POST /api/lessons - request: {:?}", request);

    let command = LessonMapper::to_create_command(request);
    match state.lesson_service.create_lesson(command).await {
        Ok(result) => {
            let now = Local::now().naive_local();
            (
                StatusCode::CREATED,
                Json(LessonMapper::to_lesson_response(result, now)),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to create lesson: {}", e);
            let status = if e.downcast_ref::<ValidationError>().is_some() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// List lessons, optionally filtered by student and/or month
async fn list_lessons(
    State(state): State<AppState>,
    Query(params): Query<LessonListParams>,
) -> impl IntoResponse {
    info!("GET /api/lessons - query: {:?}", params);

    let query = LessonListQuery {
        student_id: params.student_id,
        year: params.year,
        month: params.month,
    };

    match state.lesson_service.list_lessons(query).await {
        Ok(result) => {
            let now = Local::now().naive_local();
            (StatusCode::OK, Json(LessonMapper::to_list_response(result, now))).into_response()
        }
        Err(e) => {
            error!("Failed to list lessons: {}", e);
            let status = if e.downcast_ref::<ValidationError>().is_some() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Get a lesson by ID
async fn get_lesson(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/lessons/{}", lesson_id);

    match state.lesson_service.get_lesson(&lesson_id).await {
        Ok(Some(lesson)) => {
            let now = Local::now().naive_local();
            (StatusCode::OK, Json(LessonMapper::to_dto(lesson, now))).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "Lesson not found").into_response(),
        Err(e) => {
            error!("Failed to get lesson: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error retrieving lesson").into_response()
        }
    }
}

/// Update a lesson and reconcile its calendar event
async fn update_lesson(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
    Json(request): Json<UpdateLessonRequest>,
) -> impl IntoResponse {
    info!("PUT /api/lessons/{} - request: {:?}", lesson_id, request);

    let command = LessonMapper::to_update_command(request);
    match state.lesson_service.update_lesson(&lesson_id, command).await {
        Ok(result) => {
            let now = Local::now().naive_local();
            (StatusCode::OK, Json(LessonMapper::to_lesson_response(result, now))).into_response()
        }
        Err(e) => {
            error!("Failed to update lesson: {}", e);
            let status = if e.downcast_ref::<ValidationError>().is_some() {
                StatusCode::BAD_REQUEST
            } else if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Flip the paid flag of a lesson
async fn toggle_paid(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/lessons/{}/toggle-paid", lesson_id);

    match state.lesson_service.toggle_paid(&lesson_id).await {
        Ok(result) => {
            let now = Local::now().naive_local();
            (StatusCode::OK, Json(LessonMapper::to_lesson_response(result, now))).into_response()
        }
        Err(e) => {
            error!("Failed to toggle lesson payment: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Delete a lesson, removing its calendar event first
async fn delete_lesson(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/lessons/{}", lesson_id);

    match state.lesson_service.delete_lesson(&lesson_id).await {
        Ok(result) => (
            StatusCode::OK,
            Json(LessonMapper::to_delete_response(result)),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to delete lesson: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Push a lesson to the calendar on demand
async fn sync_lesson(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/lessons/{}/sync", lesson_id);

    match state.lesson_service.sync_lesson(&lesson_id).await {
        Ok(result) => {
            let now = Local::now().naive_local();
            (StatusCode::OK, Json(LessonMapper::to_sync_response(result, now))).into_response()
        }
        Err(e) => {
            error!("Failed to sync lesson: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Remove a lesson's calendar event, keeping the lesson itself
async fn unsync_lesson(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/lessons/{}/unsync", lesson_id);

    match state.lesson_service.unsync_lesson(&lesson_id).await {
        Ok(result) => {
            let now = Local::now().naive_local();
            (StatusCode::OK, Json(LessonMapper::to_sync_response(result, now))).into_response()
        }
        Err(e) => {
            error!("Failed to unsync lesson: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}
