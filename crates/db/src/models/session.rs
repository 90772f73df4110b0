use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

/// Session record issued by the external auth provider. The server reads it
/// to resolve caller identity and deletes it on sign-out; issuance and
/// refresh stay with the provider.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Session {
    pub id: String,
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Token lookup with the expiry predicate folded in; an expired session
    /// is indistinguishable from a missing one.
    pub async fn find_valid_by_token(
        pool: &SqlitePool,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            "SELECT id, token, user_id, expires_at, ip_address, user_agent, created_at, updated_at
             FROM session
             WHERE token = $1 AND datetime(expires_at) > datetime('now')",
        )
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete_by_token(pool: &SqlitePool, token: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM session WHERE token = $1")
            .bind(token)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
