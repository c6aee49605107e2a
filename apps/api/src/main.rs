mod autofill;
mod collaborator;
mod config;
mod errors;
mod matching;
mod models;
mod page;
mod protocol;
mod routes;
mod state;
mod tracking;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::collaborator::HttpCollaborator;
use crate::config::Config;
use crate::matching::estimator::RemoteMatchEstimator;
use crate::matching::extractor::SkillExtractor;
use crate::matching::scorer::SkillMatcher;
use crate::matching::vocabulary::SkillVocabulary;
use crate::page::agent::PageServices;
use crate::page::registry::PageRegistry;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tracking::worker::{BackgroundWorker, TrackingSettings};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CareerPilot v{}", env!("CARGO_PKG_VERSION"));

    // Skill vocabulary and local matcher
    let vocabulary = Arc::new(SkillVocabulary::extended(&config.extra_skills));
    info!("Skill vocabulary loaded ({} tokens)", vocabulary.len());
    let matcher = SkillMatcher::new(SkillExtractor::new(vocabulary));

    // External CareerPilot API
    let collaborator = Arc::new(HttpCollaborator::new(&config.api_url)?);
    info!("CareerPilot API client initialized ({})", config.api_url);

    // Injected contexts, one agent per tab
    let pages = PageRegistry::new(PageServices {
        collaborator: collaborator.clone(),
        dashboard_url: config.dashboard_url.clone(),
        resume_id: config.resume_id,
    });

    // Background context
    let (background, _worker) = BackgroundWorker::spawn(
        TrackingSettings {
            settle_delay: config.settle_delay,
            resume_id: config.resume_id,
        },
        Arc::new(pages.clone()),
        collaborator.clone(),
    );
    info!(
        "Background worker running (settle delay {}ms)",
        config.settle_delay.as_millis()
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        estimator: Arc::new(RemoteMatchEstimator::new(matcher.clone(), collaborator.clone())),
        matcher,
        collaborator,
        pages,
        background,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
