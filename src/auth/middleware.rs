//! Session gate and extractors for protected routes.

use crate::auth::coordinator::AuthCoordinator;
use crate::auth::cookie::{TOKEN_COOKIE, removal_cookie};
use crate::auth::token::TokenService;
use crate::config::Config;
use crate::error::AppError;
use crate::models::Session;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: AuthCoordinator,
    pub tokens: Arc<TokenService>,
    pub config: Arc<Config>,
}

/// Where a candidate token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Cookie,
    Bearer,
}

/// Find the candidate session token: the `token` cookie first, then
/// `Authorization: Bearer`.
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<(String, TokenSource)> {
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some((cookie.value().to_string(), TokenSource::Cookie));
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| (t.to_string(), TokenSource::Bearer))
}

/// Middleware guarding every route under the protected prefix.
///
/// No storage access: the decision depends only on the token and the secret.
/// Missing tokens redirect to the login path; invalid tokens also get the
/// cookie cleared. Valid sessions are attached to the request extensions.
pub async fn session_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let login = Redirect::to(&state.config.login_path);

    let Some((token, source)) = extract_token(&jar, request.headers()) else {
        tracing::debug!(action = "session_denied", path = %request.uri().path(), reason = "missing", "No session token");
        return login.into_response();
    };

    match state.tokens.validate(&token) {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(_) => {
            tracing::info!(action = "session_denied", path = %request.uri().path(), source = ?source, "Invalid session token");
            (jar.remove(removal_cookie()), login).into_response()
        }
    }
}

/// Authenticated session extractor.
///
/// Reads the session attached by [`session_gate`]; only usable on routes
/// behind the gate. Returns 401 Unauthorized otherwise.
pub struct AuthSession(pub Session);

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(AuthSession)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn jar_with(cookie: Option<&str>) -> CookieJar {
        let mut headers = HeaderMap::new();
        if let Some(c) = cookie {
            headers.insert(header::COOKIE, HeaderValue::from_str(c).unwrap());
        }
        CookieJar::from_headers(&headers)
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_cookie_takes_precedence() {
        let jar = jar_with(Some("token=from-cookie"));
        let found = extract_token(&jar, &bearer("from-header"));
        assert_eq!(
            found,
            Some(("from-cookie".to_string(), TokenSource::Cookie))
        );
    }

    #[test]
    fn test_bearer_fallback() {
        let jar = jar_with(Some("other=1"));
        let found = extract_token(&jar, &bearer("from-header"));
        assert_eq!(
            found,
            Some(("from-header".to_string(), TokenSource::Bearer))
        );
    }

    #[test]
    fn test_empty_cookie_falls_back_to_bearer() {
        let jar = jar_with(Some("token="));
        let found = extract_token(&jar, &bearer("from-header"));
        assert_eq!(
            found,
            Some(("from-header".to_string(), TokenSource::Bearer))
        );
    }

    #[test]
    fn test_no_token() {
        assert_eq!(extract_token(&jar_with(None), &HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&jar_with(None), &headers), None);

        assert_eq!(extract_token(&jar_with(None), &bearer("")), None);
    }
}
