use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::matching::estimator::MatchEstimate;
use crate::matching::scorer::summarize_skills;
use crate::models::application::NewApplication;
use crate::models::job::{is_job_page, JobPosting};
use crate::page::document::PageDocument;
use crate::protocol::{
    Ack, AppliedPrompt, AutoFillOutcome, DeliveryError, PageBridge, PageCommand, PageReply,
    RuntimeMessage,
};
use crate::state::AppState;
use crate::tracking::table::TabId;

pub const NOT_A_JOB_PAGE: &str = "Navigate to a job posting to see match analysis";

const SUMMARY_LIMIT: usize = 3;

#[derive(Debug, Deserialize)]
pub struct LoadPageRequest {
    pub url: String,
    #[serde(default)]
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct LoadPageResponse {
    pub tab_id: TabId,
    pub url: String,
    pub is_application_page: bool,
    pub job: Option<JobPosting>,
    pub input_count: usize,
}

/// PUT /api/v1/tabs/:tab_id/page
///
/// Injects (or re-injects) the tab's page context with a freshly loaded document.
pub async fn handle_load_page(
    State(state): State<AppState>,
    Path(tab_id): Path<i64>,
    Json(req): Json<LoadPageRequest>,
) -> Result<Json<LoadPageResponse>, AppError> {
    if req.url.trim().is_empty() {
        return Err(AppError::Validation("url must not be empty".to_string()));
    }
    let tab_id = TabId(tab_id);
    let document = PageDocument::parse(&req.url, &req.html);
    let response = LoadPageResponse {
        tab_id,
        url: document.url.clone(),
        is_application_page: document.is_application_page(),
        job: document.job_posting().cloned(),
        input_count: document.inputs.len(),
    };
    state.pages.open(tab_id, document).await;
    Ok(Json(response))
}

/// DELETE /api/v1/tabs/:tab_id
pub async fn handle_close_tab(
    State(state): State<AppState>,
    Path(tab_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let tab_id = TabId(tab_id);
    state.pages.close(tab_id).await;
    state.background.tab_closed(tab_id)?;
    Ok(StatusCode::ACCEPTED)
}

/// GET /api/v1/tabs/:tab_id/job
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(tab_id): Path<i64>,
) -> Result<Json<Option<JobPosting>>, AppError> {
    Ok(Json(job_in_tab(&state, TabId(tab_id)).await?))
}

/// GET /api/v1/tabs/:tab_id/match
pub async fn handle_get_match(
    State(state): State<AppState>,
    Path(tab_id): Path<i64>,
) -> Result<Json<MatchEstimate>, AppError> {
    let job = job_in_tab(&state, TabId(tab_id)).await?;
    let estimate = match job {
        Some(job) if is_job_page(&job.url) => state.estimator.estimate(&job).await,
        _ => MatchEstimate::unavailable(NOT_A_JOB_PAGE),
    };
    tracing::debug!(
        "Tab {tab_id}: {}% match ({:?}); matched {}; missing {}",
        estimate.result.overall_score,
        estimate.source,
        summarize_skills(&estimate.result.matched_skills, SUMMARY_LIMIT),
        summarize_skills(&estimate.result.missing_skills, SUMMARY_LIMIT),
    );
    Ok(Json(estimate))
}

/// POST /api/v1/tabs/:tab_id/autofill
pub async fn handle_auto_fill(
    State(state): State<AppState>,
    Path(tab_id): Path<i64>,
) -> Result<Json<AutoFillOutcome>, AppError> {
    match state.pages.deliver(TabId(tab_id), PageCommand::AutoFill).await? {
        PageReply::AutoFill(outcome) => Ok(Json(outcome)),
        _ => Err(DeliveryError::UnexpectedReply("autoFill").into()),
    }
}

/// GET /api/v1/tabs/:tab_id/prompt
///
/// Polled by the page shim. Returns the pending "did you apply?" prompt once.
pub async fn handle_take_prompt(
    State(state): State<AppState>,
    Path(tab_id): Path<i64>,
) -> Result<Json<Option<AppliedPrompt>>, AppError> {
    match state.pages.deliver(TabId(tab_id), PageCommand::TakePrompt).await? {
        PageReply::Prompt(prompt) => Ok(Json(prompt)),
        _ => Err(DeliveryError::UnexpectedReply("takePrompt").into()),
    }
}

/// POST /api/v1/tabs/:tab_id/messages
pub async fn handle_runtime_message(
    State(state): State<AppState>,
    Path(tab_id): Path<i64>,
    Json(message): Json<RuntimeMessage>,
) -> Result<Json<Ack>, AppError> {
    tracing::debug!("Tab {tab_id} sent {}", message.name());
    let ack = state
        .background
        .send_message(Some(TabId(tab_id)), message)
        .await?;
    Ok(Json(ack))
}

/// POST /api/v1/tabs/:tab_id/track-job
///
/// Records the tab's job in the ledger as `interested`.
pub async fn handle_track_job(
    State(state): State<AppState>,
    Path(tab_id): Path<i64>,
) -> Result<Json<Ack>, AppError> {
    let job = job_in_tab(&state, TabId(tab_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No job detected in tab {tab_id}")))?;
    let record = NewApplication::interested(state.config.resume_id, &job.url);
    state.collaborator.append_application(record).await?;
    Ok(Json(Ack::ok()))
}

async fn job_in_tab(state: &AppState, tab_id: TabId) -> Result<Option<JobPosting>, AppError> {
    match state.pages.deliver(tab_id, PageCommand::GetJobDetails).await? {
        PageReply::Job(job) => Ok(job),
        _ => Err(DeliveryError::UnexpectedReply("getJobDetails").into()),
    }
}
