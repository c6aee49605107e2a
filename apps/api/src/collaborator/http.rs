use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::collaborator::{Collaborator, CollaboratorError, JobRef};
use crate::matching::scorer::MatchResult;
use crate::models::application::NewApplication;
use crate::models::candidate::CandidateProfile;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ResumeRecord {
    id: i64,
    #[serde(default)]
    skills: Option<Vec<String>>,
    #[serde(default)]
    experience_years: Option<u32>,
    #[serde(default)]
    parsed_data: Option<ParsedResume>,
}

#[derive(Debug, Default, Deserialize)]
struct ParsedResume {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    linkedin: Option<String>,
}

impl From<ResumeRecord> for CandidateProfile {
    fn from(record: ResumeRecord) -> Self {
        let parsed = record.parsed_data.unwrap_or_default();
        CandidateProfile {
            resume_id: Some(record.id),
            name: parsed.name.unwrap_or_default(),
            email: parsed.email.unwrap_or_default(),
            phone: parsed.phone.unwrap_or_default(),
            linkedin: parsed.linkedin.unwrap_or_default(),
            years_experience: record.experience_years,
            skills: record.skills.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobSearchResponse {
    #[serde(default)]
    jobs: Vec<JobRef>,
}

/// The matching service reports a float score; it is rounded on the way in.
#[derive(Debug, Deserialize)]
struct ServerMatch {
    overall_score: f64,
    #[serde(default)]
    matched_skills: Vec<String>,
    #[serde(default)]
    missing_skills: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TailorRequest {
    resume_id: i64,
    job_id: i64,
}

#[derive(Debug, Deserialize)]
struct TailorResponse {
    #[serde(default)]
    cover_letter: Option<String>,
}

/// reqwest-backed client for the CareerPilot REST API. No retries: a failed call
/// is reported once and the caller decides whether to fall back.
#[derive(Clone)]
pub struct HttpCollaborator {
    client: Client,
    base_url: String,
}

impl HttpCollaborator {
    pub fn new(base_url: &str) -> Result<Self, CollaboratorError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, CollaboratorError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CollaboratorError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        serde_json::from_str(&body).map_err(CollaboratorError::Parse)
    }
}

#[async_trait]
impl Collaborator for HttpCollaborator {
    async fn fetch_profile(&self) -> Result<Option<CandidateProfile>, CollaboratorError> {
        let response = self.client.get(self.url("/api/resumes/")).send().await?;
        let resumes: Vec<ResumeRecord> = Self::read_json(response).await?;
        Ok(resumes.into_iter().next().map(CandidateProfile::from))
    }

    async fn search_job(&self, title: &str) -> Result<Option<JobRef>, CollaboratorError> {
        let response = self
            .client
            .get(self.url("/api/jobs/"))
            .query(&[("search", title)])
            .send()
            .await?;
        let found: JobSearchResponse = Self::read_json(response).await?;
        debug!("Job search for {title:?} returned {} hits", found.jobs.len());
        Ok(found.jobs.into_iter().next())
    }

    async fn calculate_match(
        &self,
        resume_id: i64,
        job_id: i64,
    ) -> Result<MatchResult, CollaboratorError> {
        let response = self
            .client
            .post(self.url(&format!("/api/matching/calculate/{resume_id}/{job_id}")))
            .send()
            .await?;
        let server: ServerMatch = Self::read_json(response).await?;
        Ok(MatchResult {
            overall_score: server.overall_score.round().clamp(0.0, 100.0) as u32,
            matched_skills: server.matched_skills,
            missing_skills: server.missing_skills,
        })
    }

    async fn tailor_cover_letter(
        &self,
        resume_id: i64,
        job_id: i64,
    ) -> Result<Option<String>, CollaboratorError> {
        let response = self
            .client
            .post(self.url("/api/matching/tailor"))
            .json(&TailorRequest { resume_id, job_id })
            .send()
            .await?;
        let tailored: TailorResponse = Self::read_json(response).await?;
        Ok(tailored.cover_letter.filter(|c| !c.trim().is_empty()))
    }

    async fn append_application(&self, record: NewApplication) -> Result<(), CollaboratorError> {
        let response = self
            .client
            .post(self.url("/api/applications/"))
            .json(&record)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Api {
                status: status.as_u16(),
                message,
            });
        }
        debug!("Ledger accepted {:?} record", record.status);
        Ok(())
    }
}
