//! Injected context for one tab.
//!
//! Owns the parsed page and the pending "did you apply?" prompt. Commands are
//! handled one at a time; the agent stops when its sender side is dropped.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::autofill::field_mapper::FieldMapper;
use crate::collaborator::Collaborator;
use crate::matching::estimator::NO_RESUME_MESSAGE;
use crate::models::application::NewApplication;
use crate::models::candidate::CandidateProfile;
use crate::page::document::PageDocument;
use crate::protocol::{AppliedPrompt, AutoFillOutcome, PageCommand, PageReply};
use crate::tracking::table::TabId;

/// Commands queued per tab before senders start waiting.
pub const PAGE_QUEUE_CAPACITY: usize = 32;

pub struct PageEnvelope {
    pub command: PageCommand,
    pub reply: oneshot::Sender<PageReply>,
}

/// What every injected context may reach outside its own page.
pub struct PageServices {
    pub collaborator: Arc<dyn Collaborator>,
    pub dashboard_url: String,
    /// Used for ledger records when the profile carries no resume id.
    pub resume_id: i64,
}

pub struct PageAgent {
    tab_id: TabId,
    document: PageDocument,
    pending_prompt: Option<AppliedPrompt>,
    services: Arc<PageServices>,
    rx: mpsc::Receiver<PageEnvelope>,
}

impl PageAgent {
    pub fn spawn(
        tab_id: TabId,
        document: PageDocument,
        services: Arc<PageServices>,
    ) -> mpsc::Sender<PageEnvelope> {
        let (tx, rx) = mpsc::channel(PAGE_QUEUE_CAPACITY);
        let agent = PageAgent {
            tab_id,
            document,
            pending_prompt: None,
            services,
            rx,
        };
        tokio::spawn(agent.run());
        tx
    }

    async fn run(mut self) {
        debug!("Page agent for tab {} started at {}", self.tab_id, self.document.url);
        while let Some(PageEnvelope { command, reply }) = self.rx.recv().await {
            let response = self.handle(command).await;
            let _ = reply.send(response);
        }
        debug!("Page agent for tab {} stopped", self.tab_id);
    }

    async fn handle(&mut self, command: PageCommand) -> PageReply {
        match command {
            PageCommand::GetJobDetails => PageReply::Job(self.document.job_posting().cloned()),
            PageCommand::AutoFill => PageReply::AutoFill(self.auto_fill().await),
            PageCommand::ShowAppliedPrompt { job } => {
                info!("Tab {}: asking whether the user applied to {:?}", self.tab_id, job.title);
                self.pending_prompt = Some(AppliedPrompt::new(job));
                PageReply::Ack
            }
            PageCommand::TakePrompt => PageReply::Prompt(self.pending_prompt.take()),
            PageCommand::Reload { document } => {
                debug!("Tab {} now shows {}", self.tab_id, document.url);
                self.document = *document;
                self.pending_prompt = None;
                PageReply::Ack
            }
        }
    }

    async fn auto_fill(&self) -> AutoFillOutcome {
        let collaborator = &self.services.collaborator;
        let profile = match collaborator.fetch_profile().await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                let mut outcome = AutoFillOutcome::failed(NO_RESUME_MESSAGE);
                outcome.dashboard_url = Some(self.services.dashboard_url.clone());
                return outcome;
            }
            Err(e) => {
                warn!("Tab {}: auto-fill could not load the profile: {e}", self.tab_id);
                return AutoFillOutcome::failed(format!("Could not load your profile: {e}"));
            }
        };

        let tailored = self.tailored_cover_letter(&profile).await;
        let plan = FieldMapper::new(&profile, tailored.as_deref()).plan(&self.document.inputs);
        info!(
            "Tab {}: auto-fill planned {} field(s), {} need attention",
            self.tab_id,
            plan.filled().count(),
            plan.needs_attention().count()
        );

        let resume_id = profile.resume_id.unwrap_or(self.services.resume_id);
        let record = NewApplication::auto_applied(resume_id, &self.document.url);
        if let Err(e) = collaborator.append_application(record).await {
            warn!("Tab {}: failed to record auto-applied application: {e}", self.tab_id);
        }

        AutoFillOutcome::filled(plan)
    }

    /// Tailored letter from the matching service, or `None` on any miss or failure.
    async fn tailored_cover_letter(&self, profile: &CandidateProfile) -> Option<String> {
        let resume_id = profile.resume_id?;
        let title = self.document.job.title.trim();
        if title.is_empty() {
            return None;
        }
        let collaborator = &self.services.collaborator;
        let job = match collaborator.search_job(title).await {
            Ok(Some(job)) => job,
            Ok(None) => return None,
            Err(e) => {
                debug!("Job lookup for cover letter failed: {e}");
                return None;
            }
        };
        match collaborator.tailor_cover_letter(resume_id, job.id).await {
            Ok(letter) => letter.filter(|l| !l.trim().is_empty()),
            Err(e) => {
                debug!("Cover letter tailoring failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autofill::cover_letter::fallback_cover_letter;
    use crate::autofill::field_mapper::FieldAction;
    use crate::collaborator::fake::FakeCollaborator;
    use crate::collaborator::JobRef;
    use crate::models::application::ApplicationStatus;
    use crate::models::job::JobPosting;

    const FORM: &str = r#"<html><body>
        <h1>Rust Engineer</h1>
        <form class="application">
          <input name="first_name"><input name="email">
          <input type="file" name="resume">
          <textarea name="cover_letter"></textarea>
        </form></body></html>"#;

    fn profile() -> CandidateProfile {
        CandidateProfile {
            resume_id: Some(3),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            years_experience: Some(7),
            skills: vec!["rust".to_string(), "go".to_string()],
            ..Default::default()
        }
    }

    async fn ask(tx: &mpsc::Sender<PageEnvelope>, command: PageCommand) -> PageReply {
        let (reply, rx) = oneshot::channel();
        tx.send(PageEnvelope { command, reply }).await.unwrap();
        rx.await.unwrap()
    }

    fn spawn(collaborator: Arc<FakeCollaborator>) -> mpsc::Sender<PageEnvelope> {
        let services = Arc::new(PageServices {
            collaborator,
            dashboard_url: "http://localhost:3000".to_string(),
            resume_id: 1,
        });
        PageAgent::spawn(
            TabId(1),
            PageDocument::parse("https://acme.example/apply", FORM),
            services,
        )
    }

    async fn auto_fill(tx: &mpsc::Sender<PageEnvelope>) -> AutoFillOutcome {
        match ask(tx, PageCommand::AutoFill).await {
            PageReply::AutoFill(outcome) => outcome,
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_auto_fill_without_resume_points_to_dashboard() {
        let tx = spawn(Arc::new(FakeCollaborator::default()));
        let outcome = auto_fill(&tx).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some(NO_RESUME_MESSAGE));
        assert_eq!(outcome.dashboard_url.as_deref(), Some("http://localhost:3000"));
    }

    #[tokio::test]
    async fn test_auto_fill_uses_fallback_letter_and_records_application() {
        let fake = Arc::new(FakeCollaborator::with_profile(profile()));
        let tx = spawn(fake.clone());
        let outcome = auto_fill(&tx).await;
        assert!(outcome.success);

        let plan = outcome.plan.unwrap();
        assert_eq!(plan.value_for(0), Some("Ada"));
        assert_eq!(plan.value_for(1), Some("ada@example.com"));
        assert!(matches!(
            plan.fields[2].action,
            FieldAction::NeedsManualAttention { .. }
        ));
        let fallback = fallback_cover_letter(&profile());
        assert_eq!(plan.value_for(3), Some(fallback.as_str()));

        let records = fake.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ApplicationStatus::Submitted);
        assert!(records[0].auto_applied);
        assert_eq!(records[0].resume_id, 3);
        assert!(records[0].notes.contains("https://acme.example/apply"));
    }

    #[tokio::test]
    async fn test_auto_fill_prefers_tailored_letter() {
        let fake = Arc::new(FakeCollaborator {
            job: Some(JobRef {
                id: 5,
                title: "Rust Engineer".to_string(),
                company: None,
            }),
            cover_letter: Some("Dear Acme".to_string()),
            ..FakeCollaborator::with_profile(profile())
        });
        let tx = spawn(fake);
        let plan = auto_fill(&tx).await.plan.unwrap();
        assert_eq!(plan.value_for(3), Some("Dear Acme"));
    }

    #[tokio::test]
    async fn test_ledger_failure_does_not_fail_auto_fill() {
        let fake = Arc::new(FakeCollaborator {
            ledger_unreachable: true,
            ..FakeCollaborator::with_profile(profile())
        });
        let tx = spawn(fake.clone());
        assert!(auto_fill(&tx).await.success);
        assert!(fake.records().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_profile_fails_inline() {
        let fake = Arc::new(FakeCollaborator {
            unreachable: true,
            ..Default::default()
        });
        let tx = spawn(fake);
        let outcome = auto_fill(&tx).await;
        assert!(!outcome.success);
        assert!(outcome.dashboard_url.is_none());
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_prompt_is_taken_once_and_cleared_on_reload() {
        let tx = spawn(Arc::new(FakeCollaborator::default()));
        let job = JobPosting {
            title: "Rust Engineer".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            ask(&tx, PageCommand::ShowAppliedPrompt { job: job.clone() }).await,
            PageReply::Ack
        ));
        match ask(&tx, PageCommand::TakePrompt).await {
            PageReply::Prompt(Some(prompt)) => assert_eq!(prompt.job, job),
            other => panic!("unexpected reply {other:?}"),
        }
        assert!(matches!(
            ask(&tx, PageCommand::TakePrompt).await,
            PageReply::Prompt(None)
        ));

        ask(&tx, PageCommand::ShowAppliedPrompt { job }).await;
        let next = PageDocument::parse("https://other.example", "<html></html>");
        ask(&tx, PageCommand::Reload { document: Box::new(next) }).await;
        assert!(matches!(
            ask(&tx, PageCommand::TakePrompt).await,
            PageReply::Prompt(None)
        ));
        assert!(matches!(
            ask(&tx, PageCommand::GetJobDetails).await,
            PageReply::Job(None)
        ));
    }

    #[tokio::test]
    async fn test_get_job_details() {
        let tx = spawn(Arc::new(FakeCollaborator::default()));
        match ask(&tx, PageCommand::GetJobDetails).await {
            PageReply::Job(Some(job)) => {
                assert_eq!(job.title, "Rust Engineer");
                assert_eq!(job.url, "https://acme.example/apply");
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }
}
