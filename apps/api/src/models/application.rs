use serde::{Deserialize, Serialize};

/// Lifecycle status of an application in the external ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Interested,
    Viewed,
    Submitted,
    Interview,
    Offered,
    Accepted,
    Rejected,
}

/// Append-only ledger write. `job_id: None` means the job is not in the job database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplication {
    pub job_id: Option<i64>,
    pub resume_id: i64,
    pub notes: String,
    pub status: ApplicationStatus,
    pub auto_applied: bool,
}

impl NewApplication {
    /// User confirmed (or declined) an application on an external page we tracked.
    pub fn external(resume_id: i64, job_url: &str, application_url: &str, applied: bool) -> Self {
        Self {
            job_id: None,
            resume_id,
            notes: format!("External application\nURL: {job_url}\nApplication page: {application_url}"),
            status: if applied {
                ApplicationStatus::Submitted
            } else {
                ApplicationStatus::Viewed
            },
            auto_applied: false,
        }
    }

    /// Form was filled by the auto-fill path.
    pub fn auto_applied(resume_id: i64, url: &str) -> Self {
        Self {
            job_id: None,
            resume_id,
            notes: format!("Auto-applied via CareerPilot\nURL: {url}"),
            status: ApplicationStatus::Submitted,
            auto_applied: true,
        }
    }

    /// "Track job" from the popup: the user wants to remember this posting.
    pub fn interested(resume_id: i64, url: &str) -> Self {
        Self {
            job_id: None,
            resume_id,
            notes: format!("Tracked from: {url}"),
            status: ApplicationStatus::Interested,
            auto_applied: false,
        }
    }
}
