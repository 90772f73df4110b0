//! The thin session surface the server owns. Credential issuance and OAuth
//! redirect flows live entirely with the external auth provider; this module
//! only reports the current caller and drops sessions on sign-out.

use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::user::User;
use services::services::auth::AuthSessionService;
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    identity::{MaybeIdentity, SessionToken},
};

/// Who the caller is, `null` for anonymous callers.
pub async fn get_session(
    State(state): State<AppState>,
    MaybeIdentity(user_id): MaybeIdentity,
) -> Result<ResponseJson<ApiResponse<Option<User>>>, ApiError> {
    let user = match user_id {
        Some(user_id) => User::find_by_id(&state.db.pool, &user_id).await?,
        None => None,
    };
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// Deletes the presented session row. A missing or already-dropped session
/// still signs out successfully.
pub async fn sign_out(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if let Some(token) = token {
        AuthSessionService::sign_out(&state.db.pool, &token).await?;
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/session", get(get_session))
            .route("/signout", post(sign_out)),
    )
}
