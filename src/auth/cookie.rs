//! Session cookie construction.

use axum_extra::extract::cookie::{Cookie, SameSite};

/// Name of the cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Build the `token` cookie: HttpOnly, SameSite=Lax, Path=/, with `Secure`
/// only when `secure` is set (production).
pub fn session_cookie(token: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs))
        .path("/")
        .build()
}

/// Cookie matching [`session_cookie`]'s name and path, for removal.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE).path("/").build()
}
