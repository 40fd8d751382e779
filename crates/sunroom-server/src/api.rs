//! API handlers for the Sunroom token server.

use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use sunroom_types::{ErrorBody, TokenRequest, TokenResponse};
use thiserror::Error;

const MISSING_FIELDS: &str = "Missing room or username";
const MISCONFIGURED: &str = "Server misconfigured";
const TOKEN_FAILED: &str = "Failed to create token";

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Handler for `POST /api/token`.
///
/// Mints a ten-minute join token for `username` in `room`.
pub async fn token_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!("rejected token request body: {}", rejection.body_text());
        ApiError::BadRequest(MISSING_FIELDS.to_string())
    })?;

    let (room, username) = request
        .validated()
        .ok_or_else(|| ApiError::BadRequest(MISSING_FIELDS.to_string()))?;

    if !state.token_service.has_credentials() {
        tracing::error!("LiveKit API key or secret is not configured");
        return Err(ApiError::InternalServerError(MISCONFIGURED.to_string()));
    }

    let token = state.token_service.mint(room, username).map_err(|e| {
        tracing::error!(room, username, "failed to mint token: {}", e);
        ApiError::InternalServerError(TOKEN_FAILED.to_string())
    })?;

    tracing::info!(room, username, "issued join token");
    Ok(Json(TokenResponse { token }))
}
