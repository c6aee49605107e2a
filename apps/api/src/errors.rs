use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::collaborator::CollaboratorError;
use crate::protocol::DeliveryError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Collaborator(e) => {
                tracing::error!("Collaborator error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "COLLABORATOR_ERROR",
                    "The CareerPilot API could not be reached".to_string(),
                )
            }
            AppError::Delivery(DeliveryError::TabGone(tab_id)) => (
                StatusCode::NOT_FOUND,
                "TAB_NOT_FOUND",
                format!("Tab {tab_id} has no page loaded"),
            ),
            AppError::Delivery(e) => {
                tracing::error!("Delivery error: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "DELIVERY_ERROR",
                    "The target context is not running".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::table::TabId;

    #[test]
    fn test_tab_gone_maps_to_404() {
        let response = AppError::from(DeliveryError::TabGone(TabId(3))).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_worker_stopped_maps_to_503() {
        let response = AppError::from(DeliveryError::WorkerStopped).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let response = AppError::Validation("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
