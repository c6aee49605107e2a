use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::job::JobPosting;
use crate::state::AppState;
use crate::tracking::table::{TabId, TrackedTab, MAIN_FRAME};
use crate::tracking::worker::SessionContext;

fn main_frame() -> i64 {
    MAIN_FRAME
}

#[derive(Debug, Deserialize)]
pub struct NavigationEvent {
    pub tab_id: TabId,
    #[serde(default = "main_frame")]
    pub frame_id: i64,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadCompleteEvent {
    pub tab_id: TabId,
    #[serde(default)]
    pub url: String,
}

/// POST /api/v1/browser/navigation
pub async fn handle_navigation(
    State(state): State<AppState>,
    Json(event): Json<NavigationEvent>,
) -> Result<StatusCode, AppError> {
    state
        .background
        .navigation_started(event.tab_id, event.frame_id, event.url)?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /api/v1/browser/load-complete
pub async fn handle_load_complete(
    State(state): State<AppState>,
    Json(event): Json<LoadCompleteEvent>,
) -> Result<StatusCode, AppError> {
    state
        .background
        .page_load_completed(event.tab_id, event.url)?;
    Ok(StatusCode::ACCEPTED)
}

/// GET /api/v1/tracking
pub async fn handle_tracking_snapshot(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrackedTab>>, AppError> {
    Ok(Json(state.background.tracked_tabs().await?))
}

/// GET /api/v1/session
pub async fn handle_session(
    State(state): State<AppState>,
) -> Result<Json<SessionContext>, AppError> {
    Ok(Json(state.background.session().await?))
}

/// GET /api/v1/session/job
///
/// The job most recently handed to the background, or null.
pub async fn handle_current_job(
    State(state): State<AppState>,
) -> Result<Json<Option<JobPosting>>, AppError> {
    Ok(Json(state.background.current_job().await?))
}
