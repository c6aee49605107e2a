//! Match estimation for a page the user is looking at.
//!
//! `AppState` holds an `Arc<dyn MatchEstimator>`. The remote estimator prefers the
//! matching service's score for jobs it knows, and falls back to a local keyword
//! estimate whenever the job is unknown or the service cannot be reached.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collaborator::Collaborator;
use crate::matching::scorer::{MatchResult, ScoreBand, SkillMatcher};
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobPosting;

pub const NO_RESUME_MESSAGE: &str = "Please upload your resume first!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    Server,
    Local,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEstimate {
    #[serde(flatten)]
    pub result: MatchResult,
    pub band: ScoreBand,
    pub source: EstimateSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MatchEstimate {
    fn new(result: MatchResult, source: EstimateSource) -> Self {
        Self {
            band: result.band(),
            result,
            source,
            message: None,
        }
    }

    /// Neutral estimate explaining why no real one could be made.
    pub fn unavailable(message: impl Into<String>) -> Self {
        let mut estimate = Self::new(MatchResult::neutral(), EstimateSource::Unavailable);
        estimate.message = Some(message.into());
        estimate
    }
}

#[async_trait]
pub trait MatchEstimator: Send + Sync {
    async fn estimate(&self, job: &JobPosting) -> MatchEstimate;
}

/// Keyword estimate against a known profile. Never touches the network.
pub struct LocalMatchEstimator {
    matcher: SkillMatcher,
    profile: CandidateProfile,
}

impl LocalMatchEstimator {
    pub fn new(matcher: SkillMatcher, profile: CandidateProfile) -> Self {
        Self { matcher, profile }
    }
}

#[async_trait]
impl MatchEstimator for LocalMatchEstimator {
    async fn estimate(&self, job: &JobPosting) -> MatchEstimate {
        local_estimate(&self.matcher, &self.profile, job)
    }
}

fn local_estimate(
    matcher: &SkillMatcher,
    profile: &CandidateProfile,
    job: &JobPosting,
) -> MatchEstimate {
    let result = matcher.score(&profile.skill_set(), job.scoring_text());
    MatchEstimate::new(result, EstimateSource::Local)
}

pub struct RemoteMatchEstimator {
    matcher: SkillMatcher,
    collaborator: Arc<dyn Collaborator>,
}

impl RemoteMatchEstimator {
    pub fn new(matcher: SkillMatcher, collaborator: Arc<dyn Collaborator>) -> Self {
        Self {
            matcher,
            collaborator,
        }
    }
}

#[async_trait]
impl MatchEstimator for RemoteMatchEstimator {
    async fn estimate(&self, job: &JobPosting) -> MatchEstimate {
        let profile = match self.collaborator.fetch_profile().await {
            Ok(Some(profile)) => profile,
            Ok(None) => return MatchEstimate::unavailable(NO_RESUME_MESSAGE),
            Err(e) => {
                warn!("Could not fetch candidate profile: {e}");
                return MatchEstimate::new(MatchResult::neutral(), EstimateSource::Unavailable);
            }
        };

        // Server lookup needs both a resume id and a title to search by.
        let resume_id = match profile.resume_id {
            Some(id) if !job.title.trim().is_empty() => id,
            _ => return local_estimate(&self.matcher, &profile, job),
        };

        match self.collaborator.search_job(&job.title).await {
            Ok(Some(known)) => match self.collaborator.calculate_match(resume_id, known.id).await {
                Ok(result) => return MatchEstimate::new(result, EstimateSource::Server),
                Err(e) => warn!("Server match for job {} failed: {e}", known.id),
            },
            Ok(None) => debug!("No database job for {:?}, estimating locally", job.title),
            Err(e) => warn!("Job search failed: {e}"),
        }

        local_estimate(&self.matcher, &profile, job)
    }
}
