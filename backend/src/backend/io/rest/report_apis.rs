//! # REST API for Monthly Billing Reports
//!
//! One endpoint returns the aggregated report with its CSV rendering, the
//! other writes that rendering to disk and optionally opens it. A failed
//! export is an unsuccessful response body, not an HTTP error; only invalid
//! input gets a 4xx.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::{error, info};
use serde::Deserialize;

use crate::backend::domain::commands::reports::{ExportReportCommand, MonthlyReportQuery};
use crate::backend::domain::models::validation::ValidationError;
use crate::backend::AppState;
use shared::ExportReportRequest;

// Query parameters for the monthly report API
#[derive(Debug, Deserialize)]
pub struct MonthlyReportParams {
    pub year: i32,
    pub month: u32,
}

/// Create a router for report related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/monthly", get(get_monthly_report))
        .route("/export", post(export_report))
}

/// Build the billing report for one calendar month
async fn get_monthly_report(
    State(state): State<AppState>,
    Query(params): Query<MonthlyReportParams>,
) -> impl IntoResponse {
    info!("GET /api/reports/monthly - query: {:?}", params);

    let query = MonthlyReportQuery {
        year: params.year,
        month: params.month,
    };

    match state.report_service.build_monthly_report(query).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to build monthly report: {}", e);
            let status = if e.downcast_ref::<ValidationError>().is_some() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

/// Export the monthly report to disk and optionally open it
async fn export_report(
    State(state): State<AppState>,
    Json(request): Json<ExportReportRequest>,
) -> impl IntoResponse {
    info!("POST /api/reports/export - request: {:?}", request);

    let command = ExportReportCommand {
        year: request.year as i32,
        month: request.month,
        open_after_export: request.open_after_export.unwrap_or(false),
    };

    match state
        .export_service
        .export_report(command, &state.report_service)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to export report: {}", e);
            let status = if e.downcast_ref::<ValidationError>().is_some() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::{create_router, test_fixtures};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_monthly_report_covers_the_requested_month() -> Result<(), Box<dyn std::error::Error>> {
        let test_app = test_fixtures::test_app().await;
        let app = create_router(test_app.state.clone());
        let student = test_fixtures::seed_student(&test_app.state, "Anna Nowak", Some("A1")).await;
        test_fixtures::seed_lesson(&test_app.state, &student.id, "2025-03-03T10:00:00", 1.0, 60.0).await;
        test_fixtures::seed_lesson(&test_app.state, &student.id, "2025-03-10T10:00:00", 1.5, 60.0).await;
        test_fixtures::seed_lesson(&test_app.state, &student.id, "2025-04-07T10:00:00", 1.0, 60.0).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/reports/monthly?year=2025&month=3")
                    .method(Method::GET)
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let report: shared::MonthlyReportResponse = serde_json::from_slice(&body)?;

        assert_eq!(report.filename, "Raport_2025_3.csv");
        assert_eq!(report.report.month_label, "Marzec 2025");
        assert!((report.report.total_hours - 2.5).abs() < 1e-9);
        assert!((report.report.total_amount - 150.0).abs() < 1e-9);
        assert!(report.csv_content.starts_with("Raport korepetycji za Marzec 2025"));
        assert!(report.csv_content.contains("ID Rozliczeniowe: A1"));
        assert!(!report.csv_content.contains("2025-04-07"));

        Ok(())
    }

    #[tokio::test]
    async fn test_monthly_report_rejects_invalid_month() -> Result<(), Box<dyn std::error::Error>> {
        let test_app = test_fixtures::test_app().await;
        let app = create_router(test_app.state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/reports/monthly?year=2025&month=0")
                    .method(Method::GET)
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        Ok(())
    }

    #[tokio::test]
    async fn test_export_writes_the_rendered_csv() -> Result<(), Box<dyn std::error::Error>> {
        let test_app = test_fixtures::test_app().await;
        let app = create_router(test_app.state.clone());
        let student = test_fixtures::seed_student(&test_app.state, "Anna Nowak", Some("A1")).await;
        test_fixtures::seed_lesson(&test_app.state, &student.id, "2025-03-03T10:00:00", 1.0, 60.0).await;

        let request_body = shared::ExportReportRequest {
            month: 3,
            year: 2025,
            open_after_export: None,
        };

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/reports/export")
                    .method(Method::POST)
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&request_body)?))?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let exported: shared::ExportReportResponse = serde_json::from_slice(&body)?;
        assert!(exported.success);
        assert_eq!(exported.filename, "Raport_2025_3.csv");

        let file_path = exported.file_path.expect("export should report its path");
        assert!(file_path.starts_with(test_app.export_dir.to_str().unwrap()));
        let written = std::fs::read_to_string(&file_path)?;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/reports/monthly?year=2025&month=3")
                    .method(Method::GET)
                    .body(Body::empty())?,
            )
            .await?;
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let report: shared::MonthlyReportResponse = serde_json::from_slice(&body)?;
        assert_eq!(written, report.csv_content);

        Ok(())
    }

    #[tokio::test]
    async fn test_export_rejects_invalid_month() -> Result<(), Box<dyn std::error::Error>> {
        let test_app = test_fixtures::test_app().await;
        let app = create_router(test_app.state.clone());

        let request_body = shared::ExportReportRequest {
            month: 13,
            year: 2025,
            open_after_export: None,
        };

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/reports/export")
                    .method(Method::POST)
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&request_body)?))?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        Ok(())
    }
}
