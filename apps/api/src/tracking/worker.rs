//! Background context: owns the session's current job and the tracking table.
//!
//! All mutation happens on the worker task, one event at a time, in arrival
//! order. Anything that suspends (settle-delay timers, prompt delivery, ledger
//! writes) runs in a spawned task and reports back through the same channel, so
//! the event loop never blocks. Every event is looked up against the table and
//! ignored when the tab is not there; no ordering between navigation and page
//! events is assumed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::collaborator::Collaborator;
use crate::models::application::NewApplication;
use crate::models::job::JobPosting;
use crate::protocol::{Ack, DeliveryError, PageBridge, PageCommand, RuntimeMessage};
use crate::tracking::table::{is_application_url, TabId, TrackedTab, TrackingTable, MAIN_FRAME};

/// Per-session state shared with other contexts by request only.
/// The background worker is its sole writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub current_job: Option<JobPosting>,
}

impl SessionContext {
    fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            current_job: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackingSettings {
    /// Wait between page-load-complete and the prompt. Not cancelled by later events.
    pub settle_delay: Duration,
    /// Candidate reference written on ledger records.
    pub resume_id: i64,
}

#[derive(Debug)]
pub enum BackgroundEvent {
    NavigationStarted {
        tab_id: TabId,
        frame_id: i64,
        url: String,
    },
    PageLoadCompleted {
        tab_id: TabId,
        url: String,
    },
    TabClosed {
        tab_id: TabId,
    },
    Message {
        tab_id: Option<TabId>,
        message: RuntimeMessage,
        reply: oneshot::Sender<Ack>,
    },
    PromptUndelivered {
        tab_id: TabId,
        generation: u64,
    },
    /// Session snapshot, including the current job.
    CurrentJob {
        reply: oneshot::Sender<SessionContext>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<TrackedTab>>,
    },
}

pub struct BackgroundWorker {
    session: SessionContext,
    table: TrackingTable,
    settings: TrackingSettings,
    bridge: Arc<dyn PageBridge>,
    collaborator: Arc<dyn Collaborator>,
    events_tx: mpsc::WeakUnboundedSender<BackgroundEvent>,
    events_rx: mpsc::UnboundedReceiver<BackgroundEvent>,
}

impl BackgroundWorker {
    /// Spawns the worker. It runs until every `BackgroundHandle` is dropped.
    pub fn spawn(
        settings: TrackingSettings,
        bridge: Arc<dyn PageBridge>,
        collaborator: Arc<dyn Collaborator>,
    ) -> (BackgroundHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = BackgroundWorker {
            session: SessionContext::new(),
            table: TrackingTable::new(),
            settings,
            bridge,
            collaborator,
            events_tx: tx.downgrade(),
            events_rx: rx,
        };
        info!(
            "Background worker started (session {})",
            worker.session.session_id
        );
        let task = tokio::spawn(worker.run());
        (BackgroundHandle { tx }, task)
    }

    async fn run(mut self) {
        while let Some(event) = self.events_rx.recv().await {
            self.handle(event);
        }
        if self.table.is_empty() {
            info!("Background worker stopped");
        } else {
            info!(
                "Background worker stopped with {} tab(s) still tracked",
                self.table.len()
            );
        }
    }

    fn handle(&mut self, event: BackgroundEvent) {
        match event {
            BackgroundEvent::NavigationStarted {
                tab_id,
                frame_id,
                url,
            } => self.on_navigation(tab_id, frame_id, &url),
            BackgroundEvent::PageLoadCompleted { tab_id, url } => self.on_page_loaded(tab_id, &url),
            BackgroundEvent::TabClosed { tab_id } => {
                if self.table.resolve(tab_id).is_some() {
                    info!("Tab {tab_id} closed before answering; tracking discarded");
                }
            }
            BackgroundEvent::Message {
                tab_id,
                message,
                reply,
            } => {
                let ack = self.on_message(tab_id, message);
                // Sender may have given up waiting.
                let _ = reply.send(ack);
            }
            BackgroundEvent::PromptUndelivered { tab_id, generation } => {
                if self.table.discard_if_generation(tab_id, generation) {
                    info!("Tab {tab_id} abandoned after undelivered prompt");
                }
            }
            BackgroundEvent::CurrentJob { reply } => {
                let _ = reply.send(self.session.clone());
            }
            BackgroundEvent::Snapshot { reply } => {
                let _ = reply.send(self.table.snapshot());
            }
        }
    }

    fn on_navigation(&mut self, tab_id: TabId, frame_id: i64, url: &str) {
        if frame_id != MAIN_FRAME || !is_application_url(url) {
            return;
        }
        // No job on record means the user did not come from a job page we know.
        let Some(job) = self.session.current_job.clone() else {
            debug!("Tab {tab_id} navigated to {url} with no job context; not tracking");
            return;
        };
        let generation = self.table.begin(tab_id, job, url);
        info!("Tracking tab {tab_id} (generation {generation}) at {url}");
    }

    fn on_page_loaded(&mut self, tab_id: TabId, url: &str) {
        if url.is_empty() {
            return;
        }
        let Some((generation, job)) = self
            .table
            .mark_awaiting(tab_id)
            .map(|t| (t.generation, t.job.clone()))
        else {
            return;
        };
        debug!(
            "Tab {tab_id} finished loading; prompting in {}ms",
            self.settings.settle_delay.as_millis()
        );
        self.schedule_prompt(tab_id, generation, job);
    }

    /// Fires after the settle delay regardless of what happened to the tab in
    /// between. A failed delivery drops the tab from tracking.
    fn schedule_prompt(&self, tab_id: TabId, generation: u64, job: JobPosting) {
        let delay = self.settings.settle_delay;
        let bridge = self.bridge.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match bridge
                .deliver(tab_id, PageCommand::ShowAppliedPrompt { job })
                .await
            {
                Ok(_) => debug!("Applied prompt shown in tab {tab_id}"),
                Err(e) => {
                    warn!("Could not show applied prompt in tab {tab_id}: {e}");
                    if let Some(events) = events.upgrade() {
                        let _ = events.send(BackgroundEvent::PromptUndelivered { tab_id, generation });
                    }
                }
            }
        });
    }

    fn on_message(&mut self, tab_id: Option<TabId>, message: RuntimeMessage) -> Ack {
        match message {
            RuntimeMessage::TrackExternalApplication { job } => {
                debug!("Current job set to {:?} ({})", job.title, job.url);
                self.session.current_job = Some(job);
                Ack::ok()
            }
            RuntimeMessage::UserApplied { .. } => self.resolve(tab_id, true),
            RuntimeMessage::UserDidNotApply { .. } => self.resolve(tab_id, false),
        }
    }

    fn resolve(&mut self, tab_id: Option<TabId>, applied: bool) -> Ack {
        let Some(tab_id) = tab_id else {
            warn!("Applied answer arrived without a sender tab");
            return Ack::rejected();
        };
        let Some(tracked) = self.table.resolve(tab_id) else {
            debug!("Tab {tab_id} is not tracked; answer ignored");
            return Ack::ok();
        };
        info!("Tab {tab_id} resolved (applied: {applied})");

        let record = NewApplication::external(
            self.settings.resume_id,
            &tracked.job.url,
            &tracked.application_url,
            applied,
        );
        let collaborator = self.collaborator.clone();
        tokio::spawn(async move {
            if let Err(e) = collaborator.append_application(record).await {
                warn!("Failed to record application for tab {tab_id}: {e}");
            }
        });
        Ack::ok()
    }
}

/// Cloneable sender side of the background worker.
#[derive(Clone)]
pub struct BackgroundHandle {
    tx: mpsc::UnboundedSender<BackgroundEvent>,
}

impl BackgroundHandle {
    fn post(&self, event: BackgroundEvent) -> Result<(), DeliveryError> {
        self.tx.send(event).map_err(|_| DeliveryError::WorkerStopped)
    }

    pub fn navigation_started(
        &self,
        tab_id: TabId,
        frame_id: i64,
        url: impl Into<String>,
    ) -> Result<(), DeliveryError> {
        self.post(BackgroundEvent::NavigationStarted {
            tab_id,
            frame_id,
            url: url.into(),
        })
    }

    pub fn page_load_completed(
        &self,
        tab_id: TabId,
        url: impl Into<String>,
    ) -> Result<(), DeliveryError> {
        self.post(BackgroundEvent::PageLoadCompleted {
            tab_id,
            url: url.into(),
        })
    }

    pub fn tab_closed(&self, tab_id: TabId) -> Result<(), DeliveryError> {
        self.post(BackgroundEvent::TabClosed { tab_id })
    }

    pub async fn send_message(
        &self,
        tab_id: Option<TabId>,
        message: RuntimeMessage,
    ) -> Result<Ack, DeliveryError> {
        let (reply, rx) = oneshot::channel();
        self.post(BackgroundEvent::Message {
            tab_id,
            message,
            reply,
        })?;
        rx.await.map_err(|_| DeliveryError::WorkerStopped)
    }

    pub async fn session(&self) -> Result<SessionContext, DeliveryError> {
        let (reply, rx) = oneshot::channel();
        self.post(BackgroundEvent::CurrentJob { reply })?;
        rx.await.map_err(|_| DeliveryError::WorkerStopped)
    }

    pub async fn current_job(&self) -> Result<Option<JobPosting>, DeliveryError> {
        Ok(self.session().await?.current_job)
    }

    pub async fn tracked_tabs(&self) -> Result<Vec<TrackedTab>, DeliveryError> {
        let (reply, rx) = oneshot::channel();
        self.post(BackgroundEvent::Snapshot { reply })?;
        rx.await.map_err(|_| DeliveryError::WorkerStopped)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::collaborator::fake::FakeCollaborator;
    use crate::models::application::ApplicationStatus;
    use crate::protocol::PageReply;
    use crate::tracking::table::TabState;

    const SETTLE: Duration = Duration::from_secs(5);

    #[derive(Default)]
    struct RecordingBridge {
        prompts: Mutex<Vec<(TabId, JobPosting)>>,
        gone: Mutex<HashSet<TabId>>,
    }

    impl RecordingBridge {
        fn prompts_for(&self, tab_id: TabId) -> usize {
            self.prompts
                .lock()
                .unwrap()
                .iter()
                .filter(|(t, _)| *t == tab_id)
                .count()
        }

        fn close(&self, tab_id: TabId) {
            self.gone.lock().unwrap().insert(tab_id);
        }
    }

    #[async_trait]
    impl PageBridge for RecordingBridge {
        async fn deliver(
            &self,
            tab_id: TabId,
            command: PageCommand,
        ) -> Result<PageReply, DeliveryError> {
            if self.gone.lock().unwrap().contains(&tab_id) {
                return Err(DeliveryError::TabGone(tab_id));
            }
            if let PageCommand::ShowAppliedPrompt { job } = command {
                self.prompts.lock().unwrap().push((tab_id, job));
            }
            Ok(PageReply::Ack)
        }
    }

    struct Harness {
        handle: BackgroundHandle,
        bridge: Arc<RecordingBridge>,
        ledger: Arc<FakeCollaborator>,
    }

    fn harness_with(ledger: FakeCollaborator) -> Harness {
        let bridge = Arc::new(RecordingBridge::default());
        let ledger = Arc::new(ledger);
        let (handle, _task) = BackgroundWorker::spawn(
            TrackingSettings {
                settle_delay: SETTLE,
                resume_id: 1,
            },
            bridge.clone(),
            ledger.clone(),
        );
        Harness {
            handle,
            bridge,
            ledger,
        }
    }

    fn harness() -> Harness {
        harness_with(FakeCollaborator::default())
    }

    fn job() -> JobPosting {
        JobPosting {
            title: "Platform Engineer".to_string(),
            company: "X".to_string(),
            description: "Rust and Kubernetes".to_string(),
            url: "https://x.com/jobs/42".to_string(),
        }
    }

    /// Lets spawned tasks (ledger writes, deliveries) run to completion.
    async fn drain() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    async fn track_job(h: &Harness) {
        let ack = h
            .handle
            .send_message(Some(TabId(7)), RuntimeMessage::TrackExternalApplication { job: job() })
            .await
            .unwrap();
        assert!(ack.success);
    }

    async fn state_of(h: &Harness, tab_id: TabId) -> Option<TabState> {
        h.handle
            .tracked_tabs()
            .await
            .unwrap()
            .into_iter()
            .find(|t| t.tab_id == tab_id)
            .map(|t| t.state)
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_applied() {
        let h = harness();
        let tab = TabId(1);
        track_job(&h).await;

        h.handle
            .navigation_started(tab, MAIN_FRAME, "https://x.com/careers/apply")
            .unwrap();
        assert_eq!(state_of(&h, tab).await, Some(TabState::PendingNavigation));

        h.handle
            .page_load_completed(tab, "https://x.com/careers/apply")
            .unwrap();
        assert_eq!(state_of(&h, tab).await, Some(TabState::AwaitingUserAnswer));

        tokio::time::sleep(SETTLE - Duration::from_millis(1)).await;
        drain().await;
        assert_eq!(h.bridge.prompts_for(tab), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        drain().await;
        assert_eq!(h.bridge.prompts_for(tab), 1);

        let ack = h
            .handle
            .send_message(Some(tab), RuntimeMessage::UserApplied { job: Some(job()) })
            .await
            .unwrap();
        assert!(ack.success);
        drain().await;

        let records = h.ledger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ApplicationStatus::Submitted);
        assert!(!records[0].auto_applied);
        assert!(records[0].job_id.is_none());
        assert!(records[0].notes.contains("https://x.com/jobs/42"));
        assert_eq!(state_of(&h, tab).await, None);

        // No further prompts after resolution.
        tokio::time::sleep(SETTLE * 2).await;
        drain().await;
        assert_eq!(h.bridge.prompts_for(tab), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_declined_writes_viewed_record() {
        let h = harness();
        track_job(&h).await;
        h.handle
            .navigation_started(TabId(2), MAIN_FRAME, "https://y.com/apply")
            .unwrap();
        h.handle
            .send_message(Some(TabId(2)), RuntimeMessage::UserDidNotApply { job: None })
            .await
            .unwrap();
        drain().await;
        let records = h.ledger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ApplicationStatus::Viewed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_job_context_means_no_tracking() {
        let h = harness();
        h.handle
            .navigation_started(TabId(1), MAIN_FRAME, "https://x.com/careers/apply")
            .unwrap();
        h.handle
            .page_load_completed(TabId(1), "https://x.com/careers/apply")
            .unwrap();
        assert!(h.handle.tracked_tabs().await.unwrap().is_empty());

        tokio::time::sleep(SETTLE * 2).await;
        drain().await;
        assert_eq!(h.bridge.prompts_for(TabId(1)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subframe_and_non_application_navigations_are_ignored() {
        let h = harness();
        track_job(&h).await;
        h.handle
            .navigation_started(TabId(1), 3, "https://x.com/careers/apply")
            .unwrap();
        h.handle
            .navigation_started(TabId(2), MAIN_FRAME, "https://x.com/blog")
            .unwrap();
        assert!(h.handle.tracked_tabs().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_answer_is_noop() {
        let h = harness();
        track_job(&h).await;
        h.handle
            .navigation_started(TabId(1), MAIN_FRAME, "https://x.com/apply")
            .unwrap();
        for _ in 0..2 {
            let ack = h
                .handle
                .send_message(Some(TabId(1)), RuntimeMessage::UserApplied { job: None })
                .await
                .unwrap();
            assert!(ack.success);
        }
        h.handle
            .send_message(Some(TabId(1)), RuntimeMessage::UserDidNotApply { job: None })
            .await
            .unwrap();
        drain().await;
        assert_eq!(h.ledger.records().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_answer_without_sender_tab_is_rejected() {
        let h = harness();
        let ack = h
            .handle
            .send_message(None, RuntimeMessage::UserApplied { job: None })
            .await
            .unwrap();
        assert!(!ack.success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_load_for_untracked_tab_does_nothing() {
        let h = harness();
        track_job(&h).await;
        h.handle
            .page_load_completed(TabId(5), "https://x.com/apply")
            .unwrap();
        tokio::time::sleep(SETTLE * 2).await;
        drain().await;
        assert_eq!(h.bridge.prompts_for(TabId(5)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_before_navigation_is_tolerated() {
        let h = harness();
        track_job(&h).await;
        // Out-of-order: load event first, then the navigation that starts tracking.
        h.handle
            .page_load_completed(TabId(3), "https://x.com/apply")
            .unwrap();
        h.handle
            .navigation_started(TabId(3), MAIN_FRAME, "https://x.com/apply")
            .unwrap();
        assert_eq!(state_of(&h, TabId(3)).await, Some(TabState::PendingNavigation));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_load_events_prompt_once() {
        let h = harness();
        track_job(&h).await;
        h.handle
            .navigation_started(TabId(1), MAIN_FRAME, "https://x.com/apply")
            .unwrap();
        h.handle.page_load_completed(TabId(1), "https://x.com/apply").unwrap();
        h.handle.page_load_completed(TabId(1), "https://x.com/apply").unwrap();
        tokio::time::sleep(SETTLE * 2).await;
        drain().await;
        assert_eq!(h.bridge.prompts_for(TabId(1)), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_tab_is_discarded_and_prompt_fails_quietly() {
        let h = harness();
        track_job(&h).await;
        h.handle
            .navigation_started(TabId(1), MAIN_FRAME, "https://x.com/apply")
            .unwrap();
        h.handle.page_load_completed(TabId(1), "https://x.com/apply").unwrap();
        h.bridge.close(TabId(1));
        h.handle.tab_closed(TabId(1)).unwrap();
        assert!(h.handle.tracked_tabs().await.unwrap().is_empty());

        tokio::time::sleep(SETTLE * 2).await;
        drain().await;
        assert_eq!(h.bridge.prompts_for(TabId(1)), 0);
        // A late answer finds nothing.
        h.handle
            .send_message(Some(TabId(1)), RuntimeMessage::UserApplied { job: None })
            .await
            .unwrap();
        drain().await;
        assert!(h.ledger.records().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_undelivered_prompt_abandons_tab() {
        let h = harness();
        track_job(&h).await;
        h.handle
            .navigation_started(TabId(4), MAIN_FRAME, "https://x.com/apply")
            .unwrap();
        h.handle.page_load_completed(TabId(4), "https://x.com/apply").unwrap();
        // Injected context disappears without a close event.
        h.bridge.close(TabId(4));
        tokio::time::sleep(SETTLE + Duration::from_millis(1)).await;
        drain().await;
        assert_eq!(state_of(&h, TabId(4)).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_timer_is_not_cancelled_by_renavigation() {
        let h = harness();
        track_job(&h).await;
        h.handle
            .navigation_started(TabId(1), MAIN_FRAME, "https://x.com/apply")
            .unwrap();
        h.handle.page_load_completed(TabId(1), "https://x.com/apply").unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        // User wanders off to an unrelated page before the delay elapses.
        h.handle
            .navigation_started(TabId(1), MAIN_FRAME, "https://news.example")
            .unwrap();
        tokio::time::sleep(SETTLE).await;
        drain().await;
        assert_eq!(h.bridge.prompts_for(TabId(1)), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ledger_failure_is_swallowed() {
        let h = harness_with(FakeCollaborator {
            ledger_unreachable: true,
            ..Default::default()
        });
        track_job(&h).await;
        h.handle
            .navigation_started(TabId(1), MAIN_FRAME, "https://x.com/apply")
            .unwrap();
        let ack = h
            .handle
            .send_message(Some(TabId(1)), RuntimeMessage::UserApplied { job: None })
            .await
            .unwrap();
        assert!(ack.success);
        drain().await;
        assert!(h.handle.tracked_tabs().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_carries_job_snapshot_from_navigation_time() {
        let h = harness();
        track_job(&h).await;
        h.handle
            .navigation_started(TabId(1), MAIN_FRAME, "https://x.com/apply")
            .unwrap();
        // A later job context does not rewrite the tracked snapshot.
        let other = JobPosting {
            title: "Other".to_string(),
            ..job()
        };
        h.handle
            .send_message(Some(TabId(8)), RuntimeMessage::TrackExternalApplication { job: other })
            .await
            .unwrap();
        h.handle.page_load_completed(TabId(1), "https://x.com/apply").unwrap();
        tokio::time::sleep(SETTLE * 2).await;
        drain().await;
        let prompts = h.bridge.prompts.lock().unwrap().clone();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].1.title, "Platform Engineer");

        let current = h.handle.current_job().await.unwrap();
        assert_eq!(current.unwrap().title, "Other");
    }

    #[tokio::test]
    async fn test_handle_reports_stopped_worker() {
        let (handle, task) = BackgroundWorker::spawn(
            TrackingSettings {
                settle_delay: SETTLE,
                resume_id: 1,
            },
            Arc::new(RecordingBridge::default()),
            Arc::new(FakeCollaborator::default()),
        );
        task.abort();
        let _ = task.await;
        assert!(matches!(
            handle.tracked_tabs().await,
            Err(DeliveryError::WorkerStopped)
        ));
        assert!(matches!(
            handle.tab_closed(TabId(1)),
            Err(DeliveryError::WorkerStopped)
        ));
    }
}
