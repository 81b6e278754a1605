//! Session cookie helpers and the request extractors built on them.

use crate::api::AppState;
use crate::domain::User;
use crate::error::AppError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, warn};

pub const SESSION_COOKIE: &str = "session_id";

/// Cookie carrying a freshly issued session token.
pub fn session_cookie(token: String, secure: bool, ttl_secs: i64) -> Cookie<'static> {
    let mut builder = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure);
    if let Ok(max_age) = Duration::from_secs(ttl_secs.max(0) as u64).try_into() {
        builder = builder.max_age(max_age);
    }
    builder.build()
}

/// Cookie that makes the browser forget the session.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Session token presented by the request, if any.
pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(token) = session_token(&jar) else {
        return Ok(None);
    };
    let Some(user_id) = state.sessions.user_for(&token).await? else {
        debug!("Unknown or expired session cookie");
        return Ok(None);
    };
    Ok(state.repo.get_user(user_id).await?)
}

/// The logged-in user. Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Please log in to continue".into()))
    }
}

/// The logged-in user, if there is one. A failed lookup counts as logged
/// out.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve_user(parts, state).await {
            Ok(user) => Ok(MaybeUser(user)),
            Err(e) => {
                warn!(error = %e, "Session lookup failed; treating request as logged out");
                Ok(MaybeUser(None))
            }
        }
    }
}
