pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::autofill::handlers as autofill;
use crate::matching::handlers as matching;
use crate::page::handlers as page;
use crate::state::AppState;
use crate::tracking::handlers as tracking;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Stateless matching and field mapping
        .route("/api/v1/match/estimate", post(matching::handle_estimate))
        .route("/api/v1/autofill/plan", post(autofill::handle_plan))
        // Browser events into the background context
        .route("/api/v1/browser/navigation", post(tracking::handle_navigation))
        .route(
            "/api/v1/browser/load-complete",
            post(tracking::handle_load_complete),
        )
        .route("/api/v1/tracking", get(tracking::handle_tracking_snapshot))
        .route("/api/v1/session", get(tracking::handle_session))
        .route("/api/v1/session/job", get(tracking::handle_current_job))
        // Injected contexts, per tab
        .route("/api/v1/tabs/:tab_id", delete(page::handle_close_tab))
        .route("/api/v1/tabs/:tab_id/page", put(page::handle_load_page))
        .route("/api/v1/tabs/:tab_id/job", get(page::handle_get_job))
        .route("/api/v1/tabs/:tab_id/match", get(page::handle_get_match))
        .route("/api/v1/tabs/:tab_id/autofill", post(page::handle_auto_fill))
        .route("/api/v1/tabs/:tab_id/prompt", get(page::handle_take_prompt))
        .route(
            "/api/v1/tabs/:tab_id/messages",
            post(page::handle_runtime_message),
        )
        .route("/api/v1/tabs/:tab_id/track-job", post(page::handle_track_job))
        .with_state(state)
}
