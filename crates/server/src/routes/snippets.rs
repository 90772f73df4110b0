//! Routes for snippet CRUD, starring, and the anonymous public read paths.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    Visibility,
    folder::Folder,
    snippet::{CreateSnippet, Snippet, UpdateSnippet},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, identity::Identity};

/// Create payload. Tags arrive the way the editor form sends them: one
/// comma-separated string. Ids and timestamps in the payload are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct CreateSnippetRequest {
    pub title: Option<String>,
    pub visibility: Option<Visibility>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub folder_id: Option<Uuid>,
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateSnippetRequest {
    pub title: Option<String>,
    pub visibility: Option<Visibility>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub folder_id: Option<Uuid>,
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct StarSnippetRequest {
    pub starred: bool,
}

/// Split a comma-separated tag string, dropping empty entries. All-empty
/// input normalizes to "no tags".
fn parse_tags(raw: &str) -> Option<Vec<String>> {
    let tags: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();
    (!tags.is_empty()).then_some(tags)
}

/// A folder referenced by a snippet must exist and belong to the caller.
async fn check_folder_ref(
    state: &AppState,
    user_id: &str,
    folder_id: Uuid,
) -> Result<(), ApiError> {
    Folder::find_by_id(&state.db.pool, folder_id, user_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::Validation(format!("unknown folder: {folder_id}")))
}

pub async fn create_snippet(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateSnippetRequest>,
) -> Result<ResponseJson<ApiResponse<Snippet>>, ApiError> {
    let Some(content) = payload.content.filter(|content| !content.is_empty()) else {
        return Err(ApiError::Validation("content is required".to_string()));
    };
    if let Some(folder_id) = payload.folder_id {
        check_folder_ref(&state, &identity.user_id, folder_id).await?;
    }

    let data = CreateSnippet {
        title: payload.title,
        visibility: payload.visibility,
        language: payload.language,
        description: payload.description,
        content,
        folder_id: payload.folder_id,
        tags: payload.tags.as_deref().and_then(parse_tags),
    };
    let snippet = Snippet::create(&state.db.pool, &identity.user_id, &data).await?;
    Ok(ResponseJson(ApiResponse::success(snippet)))
}

pub async fn get_snippets(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<ResponseJson<ApiResponse<Vec<Snippet>>>, ApiError> {
    let snippets = Snippet::find_by_user_id(&state.db.pool, &identity.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(snippets)))
}

pub async fn get_starred_snippets(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<ResponseJson<ApiResponse<Vec<Snippet>>>, ApiError> {
    let snippets = Snippet::find_starred(&state.db.pool, &identity.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(snippets)))
}

pub async fn get_snippet(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Snippet>>, ApiError> {
    let snippet = Snippet::find_by_id(&state.db.pool, id, &identity.user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(snippet)))
}

pub async fn update_snippet(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSnippetRequest>,
) -> Result<ResponseJson<ApiResponse<Snippet>>, ApiError> {
    if payload.content.as_deref() == Some("") {
        return Err(ApiError::Validation("content cannot be empty".to_string()));
    }
    if let Some(folder_id) = payload.folder_id {
        check_folder_ref(&state, &identity.user_id, folder_id).await?;
    }

    let data = UpdateSnippet {
        title: payload.title,
        visibility: payload.visibility,
        language: payload.language,
        description: payload.description,
        content: payload.content,
        folder_id: payload.folder_id,
        tags: payload.tags.as_deref().and_then(parse_tags),
    };
    let snippet = Snippet::update(&state.db.pool, id, &identity.user_id, &data)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(snippet)))
}

pub async fn delete_snippet(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Snippet::delete(&state.db.pool, id, &identity.user_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn star_snippet(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<StarSnippetRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let updated =
        Snippet::set_starred(&state.db.pool, id, &identity.user_id, payload.starred).await?;
    if updated == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Anonymous read path; only public rows come back.
pub async fn get_public_snippet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Snippet>>, ApiError> {
    let snippet = Snippet::find_public(&state.db.pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(snippet)))
}

/// Access pre-check used by the public snippet page. Missing rows read as
/// not public rather than an error.
pub async fn get_snippet_visibility(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<bool>>, ApiError> {
    let public = Snippet::is_public(&state.db.pool, id).await?;
    Ok(ResponseJson(ApiResponse::success(public)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/snippets",
        Router::new()
            .route("/", post(create_snippet).get(get_snippets))
            .route("/starred", get(get_starred_snippets))
            .route(
                "/{id}",
                get(get_snippet).put(update_snippet).delete(delete_snippet),
            )
            .route("/{id}/star", post(star_snippet))
            .route("/{id}/public", get(get_public_snippet))
            .route("/{id}/visibility", get(get_snippet_visibility)),
    )
}
