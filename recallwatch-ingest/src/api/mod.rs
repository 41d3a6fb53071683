//! HTTP API: health, search, stats, and authenticated ingestion triggers

pub mod auth;
pub mod health;
pub mod search;
pub mod stats;
pub mod update;

pub use auth::auth_middleware;
pub use health::health_routes;
pub use search::search_recalls;
pub use stats::recall_stats;
pub use update::{cron_update_recalls, update_recalls};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type, mapped onto HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// recallwatch-common error
    #[error(transparent)]
    Common(#[from] recallwatch_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Common(recallwatch_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::Common(recallwatch_common::Error::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, msg)
            }
            ApiError::Common(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}
