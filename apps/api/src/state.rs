use std::sync::Arc;

use crate::collaborator::Collaborator;
use crate::config::Config;
use crate::matching::estimator::MatchEstimator;
use crate::matching::scorer::SkillMatcher;
use crate::page::registry::PageRegistry;
use crate::tracking::worker::BackgroundHandle;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub matcher: SkillMatcher,
    /// Pluggable estimator for tab match scores. Default: RemoteMatchEstimator.
    pub estimator: Arc<dyn MatchEstimator>,
    pub collaborator: Arc<dyn Collaborator>,
    /// Injected contexts, one per tab.
    pub pages: PageRegistry,
    /// Background context: current job and tab tracking.
    pub background: BackgroundHandle,
}
