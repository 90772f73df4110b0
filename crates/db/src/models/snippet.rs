use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use ts_rs::TS;
use uuid::Uuid;

use super::Visibility;

const SNIPPET_COLUMNS: &str = "id, user_id, title, visibility, language, description, content, \
                               folder_id, tags, starred, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Snippet {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub visibility: Visibility,
    pub language: String,
    pub description: Option<String>,
    pub content: String,
    pub folder_id: Option<Uuid>,
    #[ts(type = "Array<string> | null")]
    pub tags: Option<Json<Vec<String>>>,
    pub starred: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload. Id and timestamps are always server-assigned; absent
/// title/visibility/language fall back to the schema defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct CreateSnippet {
    pub title: Option<String>,
    pub visibility: Option<Visibility>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub content: String,
    pub folder_id: Option<Uuid>,
    pub tags: Option<Vec<String>>,
}

/// Partial update payload. `None` leaves a column unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateSnippet {
    pub title: Option<String>,
    pub visibility: Option<Visibility>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub folder_id: Option<Uuid>,
    pub tags: Option<Vec<String>>,
}

impl Snippet {
    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Snippet>(&format!(
            "SELECT {SNIPPET_COLUMNS} FROM snippets WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_user_id(
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Snippet>(&format!(
            "SELECT {SNIPPET_COLUMNS} FROM snippets WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_folder_id(
        pool: &SqlitePool,
        folder_id: Uuid,
        user_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Snippet>(&format!(
            "SELECT {SNIPPET_COLUMNS} FROM snippets
             WHERE folder_id = $1 AND user_id = $2
             ORDER BY created_at DESC"
        ))
        .bind(folder_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_starred(pool: &SqlitePool, user_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Snippet>(&format!(
            "SELECT {SNIPPET_COLUMNS} FROM snippets
             WHERE user_id = $1 AND starred = 1
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Anonymous read path: the row is returned only when public.
    pub async fn find_public(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Snippet>(&format!(
            "SELECT {SNIPPET_COLUMNS} FROM snippets WHERE id = $1 AND visibility = 'public'"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Cheap access check before serving content to anonymous callers.
    /// A missing row collapses to "not public".
    pub async fn is_public(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let visibility: Option<(Visibility,)> =
            sqlx::query_as("SELECT visibility FROM snippets WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(matches!(visibility, Some((Visibility::Public,))))
    }

    /// Case-sensitive substring match on title, public rows only.
    /// `instr` rather than LIKE: sqlite LIKE is ASCII-case-insensitive and
    /// would need %/_ escaping.
    pub async fn search_public(pool: &SqlitePool, query: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Snippet>(&format!(
            "SELECT {SNIPPET_COLUMNS} FROM snippets
             WHERE visibility = 'public' AND instr(title, $1) > 0
             ORDER BY created_at DESC"
        ))
        .bind(query)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        user_id: &str,
        data: &CreateSnippet,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let title = data.title.clone().unwrap_or_else(|| "untitled".to_string());
        let visibility = data.visibility.unwrap_or_default();
        let language = data
            .language
            .clone()
            .unwrap_or_else(|| "plaintext".to_string());
        sqlx::query_as::<_, Snippet>(&format!(
            "INSERT INTO snippets (id, user_id, title, visibility, language, description, content, folder_id, tags)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {SNIPPET_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(title)
        .bind(visibility)
        .bind(language)
        .bind(&data.description)
        .bind(&data.content)
        .bind(data.folder_id)
        .bind(data.tags.clone().map(Json))
        .fetch_one(pool)
        .await
    }

    /// Partial update, owner-filtered. `updated_at` is overwritten with the
    /// current time regardless of the caller's payload.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
        data: &UpdateSnippet,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Snippet>(&format!(
            "UPDATE snippets
             SET title       = COALESCE($3, title),
                 visibility  = COALESCE($4, visibility),
                 language    = COALESCE($5, language),
                 description = COALESCE($6, description),
                 content     = COALESCE($7, content),
                 folder_id   = COALESCE($8, folder_id),
                 tags        = COALESCE($9, tags),
                 updated_at  = datetime('now', 'subsec')
             WHERE id = $1 AND user_id = $2
             RETURNING {SNIPPET_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(&data.title)
        .bind(data.visibility)
        .bind(&data.language)
        .bind(&data.description)
        .bind(&data.content)
        .bind(data.folder_id)
        .bind(data.tags.clone().map(Json))
        .fetch_optional(pool)
        .await
    }

    pub async fn set_starred(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
        starred: bool,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE snippets SET starred = $3 WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .bind(starred)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM snippets WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
