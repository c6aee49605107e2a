use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::job::JobPosting;

/// Opaque browser tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Frame id of a tab's top-level document.
pub const MAIN_FRAME: i64 = 0;

const APPLICATION_URL_MARKERS: &[&str] = &["apply", "application", "careers"];

/// Whether a navigation target looks like an external application page.
pub fn is_application_url(url: &str) -> bool {
    let url = url.to_lowercase();
    APPLICATION_URL_MARKERS.iter().any(|m| url.contains(m))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabState {
    PendingNavigation,
    AwaitingUserAnswer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedTab {
    pub tab_id: TabId,
    /// Job context current when the navigation was observed.
    pub job: JobPosting,
    pub application_url: String,
    pub created_at: DateTime<Utc>,
    pub state: TabState,
    /// Distinguishes successive tracking sessions in the same tab.
    pub generation: u64,
}

/// In-memory tracking table keyed by tab. Volatile: lost on restart.
#[derive(Debug, Default)]
pub struct TrackingTable {
    tabs: HashMap<TabId, TrackedTab>,
    next_generation: u64,
}

impl TrackingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) tracking a tab. Returns the new generation.
    pub fn begin(&mut self, tab_id: TabId, job: JobPosting, application_url: &str) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.tabs.insert(
            tab_id,
            TrackedTab {
                tab_id,
                job,
                application_url: application_url.to_string(),
                created_at: Utc::now(),
                state: TabState::PendingNavigation,
                generation,
            },
        );
        generation
    }

    #[cfg(test)]
    pub fn get(&self, tab_id: TabId) -> Option<&TrackedTab> {
        self.tabs.get(&tab_id)
    }

    /// PendingNavigation → AwaitingUserAnswer. `None` for untracked tabs and for
    /// tabs already awaiting an answer.
    pub fn mark_awaiting(&mut self, tab_id: TabId) -> Option<&TrackedTab> {
        let tab = self.tabs.get_mut(&tab_id)?;
        if tab.state != TabState::PendingNavigation {
            return None;
        }
        tab.state = TabState::AwaitingUserAnswer;
        Some(&*tab)
    }

    /// Removes the tab. `None` when it was not tracked (or already resolved).
    pub fn resolve(&mut self, tab_id: TabId) -> Option<TrackedTab> {
        self.tabs.remove(&tab_id)
    }

    /// Removes the tab only if it is still the same tracking session.
    pub fn discard_if_generation(&mut self, tab_id: TabId, generation: u64) -> bool {
        match self.tabs.get(&tab_id) {
            Some(tab) if tab.generation == generation => {
                self.tabs.remove(&tab_id);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// All tracked tabs ordered by tab id.
    pub fn snapshot(&self) -> Vec<TrackedTab> {
        let mut tabs: Vec<TrackedTab> = self.tabs.values().cloned().collect();
        tabs.sort_by_key(|t| t.tab_id);
        tabs
    }
}
