use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::matching::estimator::{LocalMatchEstimator, MatchEstimator};
use crate::matching::scorer::{MatchResult, ScoreBand};
use crate::matching::vocabulary::SkillSet;
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobPosting;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub candidate_skills: Vec<String>,
    pub job_text: String,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    #[serde(flatten)]
    pub result: MatchResult,
    pub band: ScoreBand,
    pub job_skills: SkillSet,
}

/// POST /api/v1/match/estimate
///
/// Local keyword estimate over raw job text. An empty job text is not an error:
/// it scores neutral like any text without skill keywords.
pub async fn handle_estimate(
    State(state): State<AppState>,
    Json(req): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, AppError> {
    let job_skills = state.matcher.extractor().extract(&req.job_text);
    let profile = CandidateProfile {
        skills: req.candidate_skills,
        ..Default::default()
    };
    let job = JobPosting {
        description: req.job_text,
        ..Default::default()
    };
    let estimate = LocalMatchEstimator::new(state.matcher.clone(), profile)
        .estimate(&job)
        .await;
    Ok(Json(EstimateResponse {
        band: estimate.band,
        result: estimate.result,
        job_skills,
    }))
}
