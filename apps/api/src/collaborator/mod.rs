//! The external CareerPilot API: resume records, the job database, the matching
//! service and the applications ledger. The core only reads profiles and jobs and
//! only appends to the ledger.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::scorer::MatchResult;
use crate::models::application::NewApplication;
use crate::models::candidate::CandidateProfile;

pub use http::HttpCollaborator;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A job from the job database, as much as the core needs of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRef {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
}

#[async_trait]
pub trait Collaborator: Send + Sync {
    /// The candidate's primary resume, or `None` if nothing was uploaded yet.
    async fn fetch_profile(&self) -> Result<Option<CandidateProfile>, CollaboratorError>;

    /// Best match for `title` in the job database.
    async fn search_job(&self, title: &str) -> Result<Option<JobRef>, CollaboratorError>;

    async fn calculate_match(
        &self,
        resume_id: i64,
        job_id: i64,
    ) -> Result<MatchResult, CollaboratorError>;

    /// Tailored cover letter for a known job, if the service produced one.
    async fn tailor_cover_letter(
        &self,
        resume_id: i64,
        job_id: i64,
    ) -> Result<Option<String>, CollaboratorError>;

    async fn append_application(&self, record: NewApplication) -> Result<(), CollaboratorError>;
}
