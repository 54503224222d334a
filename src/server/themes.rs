use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{MeResponse, Representation, split_representation};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::store::Repository;
use crate::types::Commit;

fn css_response(commit: Commit) -> Response {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        commit.content,
    )
        .into_response()
}

/// GET /me - The signed-in user and the themes they administer
pub async fn me(
    RequireUser(user_id): RequireUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let themes = state.store.list_themes_by_admin(&user_id)?;
    Ok(Json(ApiResponse::success(MeResponse { user_id, themes })))
}

/// GET /themes
pub async fn list_themes(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let themes = state.store.list_themes()?;
    Ok(Json(ApiResponse::success(themes)))
}

/// GET /users/{user_id}/themes
pub async fn list_user_themes(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let themes = state.store.list_themes_by_admin(&user_id)?;
    Ok(Json(ApiResponse::success(themes)))
}

/// GET /themes/{id} - Theme with its latest commit, or the raw stylesheet for `{id}.css`
pub async fn get_theme(
    State(state): State<Arc<AppState>>,
    Path(segment): Path<String>,
) -> Result<Response, ApiError> {
    let (id, representation) = split_representation(&segment);

    let theme = state
        .store
        .get_theme(id)?
        .or_not_found("Theme not found")?;

    match representation {
        Representation::Css => {
            let commit = theme
                .latest_commit
                .or_not_found("Theme has no commits")?;
            Ok(css_response(commit))
        }
        Representation::Json => Ok(Json(ApiResponse::success(theme)).into_response()),
    }
}

/// GET /themes/{id}/commits - Full history, oldest first
pub async fn list_commits(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.as_ref();

    store.get_theme(&id)?.or_not_found("Theme not found")?;
    let commits = store.list_commits(&id)?;

    Ok(Json(ApiResponse::success(commits)))
}

/// GET /themes/{id}/commits/{version} - One historical commit, `.css` for the raw stylesheet
pub async fn get_commit(
    State(state): State<Arc<AppState>>,
    Path((id, segment)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let (version, representation) = split_representation(&segment);
    let version: i64 = version
        .parse()
        .map_err(|_| ApiError::bad_request(format!("'{version}' is not a commit version")))?;

    let commit = state
        .store
        .get_commit(&id, version)?
        .or_not_found("Commit not found")?;

    match representation {
        Representation::Css => Ok(css_response(commit)),
        Representation::Json => Ok(Json(ApiResponse::success(commit)).into_response()),
    }
}
