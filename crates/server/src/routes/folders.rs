//! Routes for folder CRUD and hierarchy listing.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    Visibility,
    folder::{CreateFolder, Folder, UpdateFolder},
    snippet::Snippet,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, identity::Identity};

/// Create/update payload. The parent arrives as the form sends it: a folder
/// id, the literal "none", or nothing — the latter two mean "no parent".
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct FolderRequest {
    pub title: Option<String>,
    pub visibility: Option<Visibility>,
    pub description: Option<String>,
    pub parent_id: Option<String>,
}

fn normalize_parent(raw: Option<&str>) -> Result<Option<Uuid>, ApiError> {
    match raw {
        None | Some("none") | Some("") => Ok(None),
        Some(value) => Uuid::parse_str(value)
            .map(Some)
            .map_err(|_| ApiError::Validation(format!("invalid parent folder id: {value}"))),
    }
}

/// A parent folder must exist and belong to the caller.
async fn check_parent_ref(
    state: &AppState,
    user_id: &str,
    parent_id: Uuid,
) -> Result<(), ApiError> {
    Folder::find_by_id(&state.db.pool, parent_id, user_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::Validation(format!("unknown parent folder: {parent_id}")))
}

pub async fn create_folder(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<FolderRequest>,
) -> Result<ResponseJson<ApiResponse<Folder>>, ApiError> {
    let parent_id = normalize_parent(payload.parent_id.as_deref())?;
    if let Some(parent_id) = parent_id {
        check_parent_ref(&state, &identity.user_id, parent_id).await?;
    }

    let data = CreateFolder {
        title: payload.title,
        visibility: payload.visibility,
        description: payload.description,
        parent_id,
    };
    let folder = Folder::create(&state.db.pool, &identity.user_id, &data).await?;
    Ok(ResponseJson(ApiResponse::success(folder)))
}

pub async fn get_folders(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<ResponseJson<ApiResponse<Vec<Folder>>>, ApiError> {
    let folders = Folder::find_by_user_id(&state.db.pool, &identity.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(folders)))
}

pub async fn get_folder(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Folder>>, ApiError> {
    let folder = Folder::find_by_id(&state.db.pool, id, &identity.user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(folder)))
}

pub async fn get_child_folders(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Folder>>>, ApiError> {
    let folders = Folder::find_children(&state.db.pool, id, &identity.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(folders)))
}

pub async fn get_folder_snippets(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Snippet>>>, ApiError> {
    let snippets = Snippet::find_by_folder_id(&state.db.pool, id, &identity.user_id).await?;
    Ok(ResponseJson(ApiResponse::success(snippets)))
}

pub async fn update_folder(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<FolderRequest>,
) -> Result<ResponseJson<ApiResponse<Folder>>, ApiError> {
    let parent_id = normalize_parent(payload.parent_id.as_deref())?;
    if let Some(parent_id) = parent_id {
        check_parent_ref(&state, &identity.user_id, parent_id).await?;
        // Re-parenting under the folder's own subtree would orphan the chain.
        if Folder::parent_chain_contains(&state.db.pool, parent_id, id).await? {
            return Err(ApiError::Validation(
                "folder cannot be moved into its own subtree".to_string(),
            ));
        }
    }

    let data = UpdateFolder {
        title: payload.title,
        visibility: payload.visibility,
        description: payload.description,
        parent_id,
    };
    let folder = Folder::update(&state.db.pool, id, &identity.user_id, &data)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(folder)))
}

pub async fn delete_folder(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Folder::delete(&state.db.pool, id, &identity.user_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/folders",
        Router::new()
            .route("/", post(create_folder).get(get_folders))
            .route(
                "/{id}",
                get(get_folder).put(update_folder).delete(delete_folder),
            )
            .route("/{id}/folders", get(get_child_folders))
            .route("/{id}/snippets", get(get_folder_snippets)),
    )
}
