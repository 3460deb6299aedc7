//! # REST API for Student Management
//!
//! Endpoints for creating, retrieving, updating and deleting students. The
//! detail endpoint returns the record together with its financial aggregates
//! and the lesson history.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::Local;
use log::{error, info};

use crate::backend::domain::models::validation::ValidationError;
use crate::backend::io::rest::mappers::student_mapper::StudentMapper;
use crate::backend::AppState;
use shared::{CreateStudentRequest, UpdateStudentRequest};

/// Create a router for student related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route(
            "/:student_id",
            get(get_student).put(update_student).delete(delete_student),
        )
}

/// Create a new student
async fn create_student(
    State(state): State<AppState>,
    Json(request): Json<CreateStudentRequest>,
) -> impl IntoResponse {
    info!("POST /api/students - request: {:?}", request);

    let command = StudentMapper::to_create_command(request);
    match state.student_service.create_student(command).await {
        Ok(result) => (
            StatusCode::CREATED,
            Json(StudentMapper::to_student_response(result)),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to create student: {}", e);
            let status = if e.downcast_ref::<ValidationError>().is_some() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// List all students ordered by display name
async fn list_students(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/students");

    match state.student_service.list_students().await {
        Ok(result) => (StatusCode::OK, Json(StudentMapper::to_list_response(result))).into_response(),
        Err(e) => {
            error!("Failed to list students: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error listing students").into_response()
        }
    }
}

/// Get a student with aggregates and lesson history
async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/students/{}", student_id);

    match state.student_service.student_detail(&student_id).await {
        Ok(result) => {
            let now = Local::now().naive_local();
            (
                StatusCode::OK,
                Json(StudentMapper::to_detail_response(result, now)),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to get student: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Update a student
async fn update_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(request): Json<UpdateStudentRequest>,
) -> impl IntoResponse {
    info!("PUT /api/students/{} - request: {:?}", student_id, request);

    let command = StudentMapper::to_update_command(request);
    match state.student_service.update_student(&student_id, command).await {
        Ok(result) => (
            StatusCode::OK,
            Json(StudentMapper::to_student_response(result)),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to update student: {}", e);
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

/// Delete a student and cascade through its lessons
async fn delete_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/students/{}", student_id);

    match state.student_service.delete_student(&student_id).await {
        Ok(result) => (
            StatusCode::OK,
            Json(StudentMapper::to_delete_response(result)),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to delete student: {}", e);
            let status = if e.to_string().contains("not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}
