//! API route handlers.

pub mod auth;
pub mod session;

use crate::auth::middleware::{AppState, session_gate};
use crate::middleware::security_headers;
use axum::{Router, extract::DefaultBodyLimit, routing::get, routing::post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Upper bound on request bodies; the largest valid one is a verify request.
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Build the API router with all endpoints.
///
/// Every path under `config.protected_prefix`, including unmatched ones,
/// sits behind the session gate.
pub fn api_router(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", get(session::current_session))
        .route("/session", get(session::current_session))
        .fallback(session::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_gate,
        ));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        // Auth endpoints
        .route("/auth/challenge", get(auth::request_challenge))
        .route("/auth/verify", post(auth::verify_challenge))
        .route("/auth/logout", post(auth::logout))
        // Protected endpoints
        .nest(&state.config.protected_prefix, protected)
}

/// Build the complete application: routes, layers, and state.
pub fn app(state: AppState) -> Router {
    // Explicit CORS: deny all cross-origin requests (single-origin deployment).
    let cors = CorsLayer::new();

    api_router(&state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(security_headers))
        .with_state(state)
}
