//! Bearer-token authentication for the ingestion trigger endpoints
//!
//! The scheduled caller supplies `Authorization: Bearer <secret>`; a
//! mismatch is rejected up front with no work performed. An unset secret
//! disables auth entirely (local development and tests).

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::AppState;

/// Authentication middleware for protected routes.
///
/// **Note:** applied to the ingestion triggers only; read endpoints and
/// /health stay public.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // No configured secret disables auth checking
    let Some(secret) = state.ingest_secret.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(value) if value == format!("Bearer {}", secret) => Ok(next.run(request).await),
        Some(_) => {
            warn!("Rejected ingestion trigger: bearer token mismatch");
            Err(AuthError::InvalidToken)
        }
        None => {
            warn!("Rejected ingestion trigger: missing Authorization header");
            Err(AuthError::MissingToken)
        }
    }
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing bearer token",
            AuthError::InvalidToken => "Invalid bearer token",
        };

        let body = Json(json!({
            "error": message,
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
