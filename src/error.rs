//! Error types and Axum response conversions.

use crate::storage::StoreError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Outcomes of the challenge/verify protocol and session validation.
///
/// Signature and token failures each collapse to a single variant with no
/// detail attached.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid address")]
    InvalidAddress,

    #[error("invalid request body")]
    InvalidRequestBody,

    #[error("invalid or expired nonce")]
    InvalidOrExpiredNonce,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid token")]
    InvalidToken,

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Application error types.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Internal(msg) => {
                // Log detailed error server-side, return generic message to client
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidAddress => {
                AppError::BadRequest("Valid Ethereum address required".to_string())
            }
            AuthError::InvalidRequestBody => {
                AppError::BadRequest("address, signature and nonce are required".to_string())
            }
            AuthError::InvalidOrExpiredNonce => {
                AppError::Unauthorized("Invalid or expired nonce".to_string())
            }
            AuthError::InvalidSignature => AppError::Unauthorized("Invalid signature".to_string()),
            AuthError::InvalidToken => {
                AppError::Unauthorized("Invalid or expired token".to_string())
            }
            AuthError::Store(e) => AppError::Internal(format!("Storage error: {}", e)),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(format!("Storage error: {}", err))
    }
}
