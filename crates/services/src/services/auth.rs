//! Caller identity resolution against the auth provider's session table.
//!
//! Credential issuance, OAuth redirects, and refresh are the external auth
//! provider's business; the server consumes exactly one operation — map the
//! presented credential to an optional user id.

use db::models::session::Session;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct AuthSessionService;

impl AuthSessionService {
    /// Resolve a session token to a user id. `None` means the caller stays
    /// anonymous — unknown and expired tokens are not distinguished.
    pub async fn resolve(pool: &SqlitePool, token: &str) -> Result<Option<String>, AuthError> {
        let session = Session::find_valid_by_token(pool, token).await?;
        if session.is_none() {
            debug!("session token did not resolve to a user");
        }
        Ok(session.map(|session| session.user_id))
    }

    /// Drop the presented session. Returns whether a row was removed.
    pub async fn sign_out(pool: &SqlitePool, token: &str) -> Result<bool, AuthError> {
        Ok(Session::delete_by_token(pool, token).await? > 0)
    }
}
