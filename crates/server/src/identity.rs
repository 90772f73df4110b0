//! Caller identity extractors.
//!
//! Every request resolves to exactly one of Anonymous or
//! Authenticated(user id) before its handler body runs. Handlers pick the
//! contract by extracting [`Identity`] (401 on anonymous) or
//! [`MaybeIdentity`]. The credential is the bearer token or session cookie
//! issued by the external auth provider; its resolution is a single session
//! lookup in [`AuthSessionService`].

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use services::services::auth::AuthSessionService;

use crate::{AppState, error::ApiError};

const SESSION_COOKIE: &str = "session_token";

/// Authenticated caller.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
}

/// Caller that may be anonymous.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<String>);

/// The raw session credential, when one was presented at all. Used by
/// sign-out, which operates on the token rather than the user.
#[derive(Debug, Clone)]
pub struct SessionToken(pub Option<String>);

fn credential_from_parts(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if let Some(token) = bearer {
        return Some(token.to_string());
    }
    parts
        .headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(session_cookie_value)
}

fn session_cookie_value(cookies: &str) -> Option<String> {
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

impl FromRequestParts<AppState> for SessionToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(credential_from_parts(parts)))
    }
}

impl FromRequestParts<AppState> for MaybeIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = credential_from_parts(parts) else {
            return Ok(Self(None));
        };
        let user_id = AuthSessionService::resolve(&state.db.pool, &token).await?;
        Ok(Self(user_id))
    }
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeIdentity(user_id) = MaybeIdentity::from_request_parts(parts, state).await?;
        user_id
            .map(|user_id| Self { user_id })
            .ok_or(ApiError::Unauthorized)
    }
}
