//! Messages exchanged between the background context and the per-tab injected
//! contexts. Delivery is fire-and-forget from the sender's point of view: a
//! closed tab surfaces as `DeliveryError::TabGone`, never as a panic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::autofill::field_mapper::FillPlan;
use crate::models::job::JobPosting;
use crate::page::document::PageDocument;
use crate::tracking::table::TabId;

pub const APPLIED_QUESTION: &str = "Did you apply to this job?";

/// Injected → background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RuntimeMessage {
    /// The user is about to leave a job page for an external application.
    TrackExternalApplication { job: JobPosting },
    UserApplied {
        #[serde(default)]
        job: Option<JobPosting>,
    },
    UserDidNotApply {
        #[serde(default)]
        job: Option<JobPosting>,
    },
}

impl RuntimeMessage {
    pub fn name(&self) -> &'static str {
        match self {
            RuntimeMessage::TrackExternalApplication { .. } => "trackExternalApplication",
            RuntimeMessage::UserApplied { .. } => "userApplied",
            RuntimeMessage::UserDidNotApply { .. } => "userDidNotApply",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }

    pub fn rejected() -> Self {
        Self { success: false }
    }
}

/// Background or popup → injected.
#[derive(Debug, Clone)]
pub enum PageCommand {
    GetJobDetails,
    AutoFill,
    ShowAppliedPrompt { job: JobPosting },
    /// Shim poll: hand over the pending prompt, if any, and clear it.
    TakePrompt,
    /// A new document now occupies the tab.
    Reload { document: Box<PageDocument> },
}

#[derive(Debug, Clone)]
pub enum PageReply {
    Job(Option<JobPosting>),
    AutoFill(AutoFillOutcome),
    Prompt(Option<AppliedPrompt>),
    Ack,
}

/// The "did you apply?" question waiting to be rendered in a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedPrompt {
    pub question: String,
    pub job: JobPosting,
    pub prompted_at: DateTime<Utc>,
}

impl AppliedPrompt {
    pub fn new(job: JobPosting) -> Self {
        Self {
            question: APPLIED_QUESTION.to_string(),
            job,
            prompted_at: Utc::now(),
        }
    }
}

/// Result of a user-initiated auto-fill. Failures carry an inline message and
/// the user may simply retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoFillOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<FillPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
}

impl AutoFillOutcome {
    pub fn filled(plan: FillPlan) -> Self {
        Self {
            success: true,
            plan: Some(plan),
            error: None,
            dashboard_url: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            plan: None,
            error: Some(error.into()),
            dashboard_url: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// No injected context is listening in that tab any more.
    #[error("tab {0} is gone")]
    TabGone(TabId),

    #[error("background worker has stopped")]
    WorkerStopped,

    #[error("unexpected reply to {0}")]
    UnexpectedReply(&'static str),
}

/// Delivery of commands into a tab's injected context.
#[async_trait]
pub trait PageBridge: Send + Sync {
    async fn deliver(&self, tab_id: TabId, command: PageCommand) -> Result<PageReply, DeliveryError>;
}
