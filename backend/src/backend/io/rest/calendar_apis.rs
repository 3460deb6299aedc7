//! # REST API for Calendar Views and External Calendar State
//!
//! Serves the month/week/day grids with lessons bucketed onto them, the
//! focus-date navigation endpoints, and the external calendar surface:
//! available calendars, default-calendar selection, authorization state and
//! the upcoming lesson events.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use log::{error, info};
use serde::Deserialize;

use crate::backend::domain::commands::lessons::LessonListQuery;
use crate::backend::domain::models::LESSON_DATE_FORMAT;
use crate::backend::io::rest::mappers::lesson_mapper::LessonMapper;
use crate::backend::AppState;
use shared::{
    CalendarAuthorizationResponse, CalendarFocusResponse, CalendarInfo, CalendarListResponse,
    SetCalendarFocusRequest, SetDefaultCalendarRequest, SetDefaultCalendarResponse,
    UpcomingEventsResponse,
};

/// How far ahead the upcoming-events endpoint looks by default
const DEFAULT_UPCOMING_DAYS: i64 = 7;

// Query parameters for the month grid API
#[derive(Debug, Deserialize)]
pub struct CalendarMonthQuery {
    pub month: u32,
    pub year: u32,
}

// Query parameters for the week and day grid APIs
#[derive(Debug, Deserialize)]
pub struct CalendarDateQuery {
    pub date: String,
}

// Query parameters for the upcoming events API
#[derive(Debug, Deserialize)]
pub struct UpcomingEventsQuery {
    pub days_ahead: Option<i64>,
}

/// Create a router for calendar related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/month", get(get_calendar_month))
        .route("/week", get(get_calendar_week))
        .route("/day", get(get_day_schedule))
        .route("/current-date", get(get_current_date))
        .route("/focus-date", get(get_focus_date).post(set_focus_date))
        .route("/focus-date/previous", post(navigate_previous_month))
        .route("/focus-date/next", post(navigate_next_month))
        .route("/calendars", get(list_calendars))
        .route("/default-calendar", post(set_default_calendar))
        .route("/authorization", get(authorization_status))
        .route("/upcoming", get(upcoming_events))
}

/// Load every lesson and map it for grid bucketing with one `now` snapshot.
/// Grids drop whatever falls outside their cells, so no pre-filtering here.
async fn all_lessons_as_dtos(state: &AppState) -> Result<Vec<shared::Lesson>, ()> {
    let result = state
        .lesson_service
        .list_lessons(LessonListQuery::default())
        .await
        .map_err(|e| {
            error!("Failed to load lessons for the calendar grid: {}", e);
        })?;

    let now = Local::now().naive_local();
    Ok(result
        .lessons
        .into_iter()
        .map(|lesson| LessonMapper::to_dto(lesson, now))
        .collect())
}

/// Get the month grid with lessons bucketed onto its days
async fn get_calendar_month(
    State(state): State<AppState>,
    Query(query): Query<CalendarMonthQuery>,
) -> impl IntoResponse {
    info!("GET /api/calendar/month - query: {:?}", query);

    if NaiveDate::from_ymd_opt(query.year as i32, query.month, 1).is_none() {
        return (StatusCode::BAD_REQUEST, "Invalid month/year").into_response();
    }

    let lessons = match all_lessons_as_dtos(&state).await {
        Ok(lessons) => lessons,
        Err(()) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error loading lessons").into_response()
        }
    };

    let calendar_month = state
        .calendar_service
        .generate_calendar_month(query.month, query.year, lessons);
    (StatusCode::OK, Json(calendar_month)).into_response()
}

/// Get the week grid containing the given date
async fn get_calendar_week(
    State(state): State<AppState>,
    Query(query): Query<CalendarDateQuery>,
) -> impl IntoResponse {
    info!("GET /api/calendar/week - query: {:?}", query);

    let reference = match NaiveDate::parse_from_str(&query.date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid date, expected YYYY-MM-DD").into_response(),
    };

    let lessons = match all_lessons_as_dtos(&state).await {
        Ok(lessons) => lessons,
        Err(()) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error loading lessons").into_response()
        }
    };

    let calendar_week = state.calendar_service.generate_calendar_week(reference, lessons);
    (StatusCode::OK, Json(calendar_week)).into_response()
}

/// Get the working-hours schedule of a single day
async fn get_day_schedule(
    State(state): State<AppState>,
    Query(query): Query<CalendarDateQuery>,
) -> impl IntoResponse {
    info!("GET /api/calendar/day - query: {:?}", query);

    let date = match NaiveDate::parse_from_str(&query.date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid date, expected YYYY-MM-DD").into_response(),
    };

    let lessons = match all_lessons_as_dtos(&state).await {
        Ok(lessons) => lessons,
        Err(()) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error loading lessons").into_response()
        }
    };

    let schedule = state.calendar_service.generate_day_schedule(date, lessons);
    (StatusCode::OK, Json(schedule)).into_response()
}

/// Get current date information from the backend
async fn get_current_date(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/calendar/current-date");

    let current_date = state.calendar_service.get_current_date();
    (StatusCode::OK, Json(current_date)).into_response()
}

/// Get the current focus date for calendar navigation
async fn get_focus_date(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/calendar/focus-date");

    let focus_date = state.calendar_service.get_focus_date();
    (StatusCode::OK, Json(focus_date)).into_response()
}

/// Set the focus date for calendar navigation
async fn set_focus_date(
    State(state): State<AppState>,
    Json(request): Json<SetCalendarFocusRequest>,
) -> impl IntoResponse {
    info!("POST /api/calendar/focus-date - request: {:?}", request);

    match state.calendar_service.set_focus_date(request.month, request.year) {
        Ok(focus_date) => {
            let response = CalendarFocusResponse {
                focus_date,
                success_message: format!(
                    "Calendar focus set to {} {}",
                    state.calendar_service.month_name(request.month),
                    request.year
                ),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to set focus date: {}", e);
            (StatusCode::BAD_REQUEST, e).into_response()
        }
    }
}

/// Navigate to the previous month
async fn navigate_previous_month(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/calendar/focus-date/previous");

    let focus_date = state.calendar_service.navigate_previous_month();
    let response = CalendarFocusResponse {
        success_message: format!(
            "Navigated to {} {}",
            state.calendar_service.month_name(focus_date.month),
            focus_date.year
        ),
        focus_date,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Navigate to the next month
async fn navigate_next_month(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/calendar/focus-date/next");

    let focus_date = state.calendar_service.navigate_next_month();
    let response = CalendarFocusResponse {
        success_message: format!(
            "Navigated to {} {}",
            state.calendar_service.month_name(focus_date.month),
            focus_date.year
        ),
        focus_date,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// List the writable external calendars, marking the configured default
async fn list_calendars(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/calendar/calendars");

    let (authorized, calendars) = state.sync_service.list_calendars().await;
    // Only an explicitly configured calendar is marked; the first-available
    // fallback used when filing events does not show up here
    let configured_id = state
        .settings_service
        .get_settings()
        .await
        .ok()
        .and_then(|settings| settings.default_calendar_id);

    let calendars = calendars
        .into_iter()
        .map(|calendar| CalendarInfo {
            is_default: configured_id.as_deref() == Some(calendar.id.as_str()),
            id: calendar.id,
            title: calendar.title,
        })
        .collect();

    (
        StatusCode::OK,
        Json(CalendarListResponse {
            calendars,
            authorized,
        }),
    )
        .into_response()
}

/// Select the calendar new lesson events are filed into
async fn set_default_calendar(
    State(state): State<AppState>,
    Json(request): Json<SetDefaultCalendarRequest>,
) -> impl IntoResponse {
    info!("POST /api/calendar/default-calendar - request: {:?}", request);

    match state
        .settings_service
        .set_default_calendar(&request.calendar_id)
        .await
    {
        Ok(settings) => {
            let response = SetDefaultCalendarResponse {
                default_calendar_id: settings.default_calendar_id.unwrap_or_default(),
                success_message: "Default calendar updated".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to set default calendar: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Report the cached calendar authorization state
async fn authorization_status(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/calendar/authorization");

    let authorized = state.sync_service.ensure_authorized().await;
    (StatusCode::OK, Json(CalendarAuthorizationResponse { authorized })).into_response()
}

/// List upcoming lesson events from the external calendar
async fn upcoming_events(
    State(state): State<AppState>,
    Query(query): Query<UpcomingEventsQuery>,
) -> impl IntoResponse {
    info!("GET /api/calendar/upcoming - query: {:?}", query);

    let days_ahead = query.days_ahead.unwrap_or(DEFAULT_UPCOMING_DAYS);
    if days_ahead < 0 {
        return (StatusCode::BAD_REQUEST, "days_ahead cannot be negative").into_response();
    }

    let events = state
        .sync_service
        .upcoming_lesson_events(days_ahead)
        .await
        .into_iter()
        .map(|event| shared::UpcomingEvent {
            event_id: event.id,
            calendar_id: event.calendar_id,
            title: event.title,
            start: event.start.format(LESSON_DATE_FORMAT).to_string(),
            end: event.end.format(LESSON_DATE_FORMAT).to_string(),
        })
        .collect();

    (
        StatusCode::OK,
        Json(UpcomingEventsResponse { events, days_ahead }),
    )
        .into_response()
}
