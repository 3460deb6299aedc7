//! # REST API for Application Settings
//!
//! Read and update the process-wide preferences: the default calendar and
//! the auto-sync flag applied to freshly created lessons.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::{error, info};

use crate::backend::domain::models::settings::AppSettings;
use crate::backend::AppState;
use shared::{Settings, SettingsResponse, UpdateSettingsRequest};

/// Create a router for settings related APIs
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_settings).put(update_settings))
}

fn to_settings_dto(settings: AppSettings) -> Settings {
    Settings {
        default_calendar_id: settings.default_calendar_id,
        auto_sync_on_create: settings.auto_sync_on_create,
    }
}

/// Get the current settings
async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/settings");

    match state.settings_service.get_settings().await {
        Ok(settings) => {
            let response = SettingsResponse {
                settings: to_settings_dto(settings),
                success_message: "Settings loaded".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to read settings: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error reading settings").into_response()
        }
    }
}

/// Apply a partial settings update
async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> impl IntoResponse {
    info!("PUT /api/settings - request: {:?}", request);

    match state
        .settings_service
        .update_settings(request.default_calendar_id, request.auto_sync_on_create)
        .await
    {
        Ok(settings) => {
            let response = SettingsResponse {
                settings: to_settings_dto(settings),
                success_message: "Settings updated".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to update settings: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
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
    async fn test_get_settings_returns_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let test_app = test_fixtures::test_app().await;
        let app = create_router(test_app.state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/settings")
                    .method(Method::GET)
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let settings: shared::SettingsResponse = serde_json::from_slice(&body)?;
        assert_eq!(settings.settings.default_calendar_id, None);
        assert!(settings.settings.auto_sync_on_create);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_settings_persists() -> Result<(), Box<dyn std::error::Error>> {
        let test_app = test_fixtures::test_app().await;
        let app = create_router(test_app.state.clone());

        let request_body = shared::UpdateSettingsRequest {
            default_calendar_id: Some("local".to_string()),
            auto_sync_on_create: Some(false),
        };

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/settings")
                    .method(Method::PUT)
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&request_body)?))?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let updated: shared::SettingsResponse = serde_json::from_slice(&body)?;
        assert_eq!(updated.settings.default_calendar_id, Some("local".to_string()));
        assert!(!updated.settings.auto_sync_on_create);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/settings")
                    .method(Method::GET)
                    .body(Body::empty())?,
            )
            .await?;
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let reloaded: shared::SettingsResponse = serde_json::from_slice(&body)?;
        assert_eq!(reloaded.settings.default_calendar_id, Some("local".to_string()));
        assert!(!reloaded.settings.auto_sync_on_create);

        Ok(())
    }
}
