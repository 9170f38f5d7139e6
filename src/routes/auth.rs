//! Auth API endpoints.

use crate::auth::cookie::{removal_cookie, session_cookie};
use crate::auth::middleware::AppState;
use crate::error::{AppError, AuthError};
use crate::models::{ChallengeQuery, ChallengeResponse, VerifyRequest, VerifyResponse};
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;

/// GET /auth/challenge?address=0x... — Issue a nonce and the message to sign
pub async fn request_challenge(
    State(state): State<AppState>,
    Query(query): Query<ChallengeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let address = query.address.ok_or(AuthError::InvalidAddress)?;
    let challenge = state.coordinator.challenge(&address).await?;

    Ok(Json(ChallengeResponse {
        nonce: challenge.nonce,
        message: challenge.message,
    }))
}

/// POST /auth/verify — Verify the signed challenge and start a session
pub async fn verify_challenge(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body.map_err(|_| AppError::BadRequest("Invalid JSON body".to_string()))?;

    let (Some(address), Some(signature), Some(nonce)) = (req.address, req.signature, req.nonce)
    else {
        return Err(AuthError::InvalidRequestBody.into());
    };

    let token = state
        .coordinator
        .verify(&address, &signature, &nonce)
        .await?;

    let cookie = session_cookie(
        token.clone(),
        state.tokens.ttl().num_seconds(),
        state.config.production,
    );

    Ok((jar.add(cookie), Json(VerifyResponse { token })))
}

/// POST /auth/logout — Clear the session cookie
///
/// Tokens are stateless, so this only removes the browser's copy.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jar.remove(removal_cookie()), StatusCode::NO_CONTENT)
}
