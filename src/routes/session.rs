//! Protected endpoints mounted under the configured prefix.

use crate::auth::middleware::AuthSession;
use crate::models::Session;
use axum::Json;
use axum::http::StatusCode;

/// GET {prefix}/ and {prefix}/session — Current session details
pub async fn current_session(AuthSession(session): AuthSession) -> Json<Session> {
    Json(session)
}

/// Fallback for unknown paths under the prefix, reached only with a session.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
