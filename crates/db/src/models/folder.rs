use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::Visibility;

const FOLDER_COLUMNS: &str =
    "id, user_id, title, visibility, description, parent_id, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Folder {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub visibility: Visibility,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct CreateFolder {
    pub title: Option<String>,
    pub visibility: Option<Visibility>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
}

/// Partial update payload. Unlike the other fields, `parent_id` is always
/// written: `None` re-roots the folder at the top level.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateFolder {
    pub title: Option<String>,
    pub visibility: Option<Visibility>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
}

impl Folder {
    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE id = $1 AND user_id = $2"
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
        sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_children(
        pool: &SqlitePool,
        parent_id: Uuid,
        user_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders
             WHERE parent_id = $1 AND user_id = $2
             ORDER BY created_at DESC"
        ))
        .bind(parent_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        user_id: &str,
        data: &CreateFolder,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let title = data.title.clone().unwrap_or_else(|| "untitled".to_string());
        let visibility = data.visibility.unwrap_or_default();
        sqlx::query_as::<_, Folder>(&format!(
            "INSERT INTO folders (id, user_id, title, visibility, description, parent_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(title)
        .bind(visibility)
        .bind(&data.description)
        .bind(data.parent_id)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        user_id: &str,
        data: &UpdateFolder,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Folder>(&format!(
            "UPDATE folders
             SET title       = COALESCE($3, title),
                 visibility  = COALESCE($4, visibility),
                 description = COALESCE($5, description),
                 parent_id   = $6,
                 updated_at  = datetime('now', 'subsec')
             WHERE id = $1 AND user_id = $2
             RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(&data.title)
        .bind(data.visibility)
        .bind(&data.description)
        .bind(data.parent_id)
        .fetch_optional(pool)
        .await
    }

    /// Child folders and contained snippets go with the folder through the
    /// storage-level cascades.
    pub async fn delete(pool: &SqlitePool, id: Uuid, user_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Walks the parent chain upward from `start` and reports whether
    /// `target` appears in it (including `start` itself). Used to refuse
    /// re-parenting a folder into its own subtree. The walk is bounded so a
    /// corrupted chain cannot spin forever; past the bound it is treated as
    /// cyclic.
    pub async fn parent_chain_contains(
        pool: &SqlitePool,
        start: Uuid,
        target: Uuid,
    ) -> Result<bool, sqlx::Error> {
        const MAX_DEPTH: usize = 64;

        let mut current = Some(start);
        for _ in 0..MAX_DEPTH {
            let Some(id) = current else {
                return Ok(false);
            };
            if id == target {
                return Ok(true);
            }
            let row: Option<(Option<Uuid>,)> =
                sqlx::query_as("SELECT parent_id FROM folders WHERE id = $1")
                    .bind(id)
                    .fetch_optional(pool)
                    .await?;
            current = row.and_then(|(parent,)| parent);
        }
        Ok(true)
    }
}
