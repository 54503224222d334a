use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State, multipart::Field},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse};
use crate::themes::{CommitSubmission, submit_commit};

/// Room for a full stylesheet, metadata and a complete set of previews.
pub const MAX_COMMIT_BODY: usize = 6 * 1024 * 1024;

async fn text(field: Field<'_>, name: &str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read {name}: {e}")))
}

async fn parse_commit_form(multipart: &mut Multipart) -> Result<CommitSubmission, ApiError> {
    let mut submission = CommitSubmission::default();
    let mut theme_id: Option<String> = None;
    let mut target_version: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "theme_id" => theme_id = Some(text(field, &name).await?),
            "commit_id" => target_version = Some(text(field, &name).await?),
            "name" => submission.name = text(field, &name).await?,
            "description" => submission.description = text(field, &name).await?,
            "content" => submission.content = text(field, &name).await?,
            "message" => submission.message = text(field, &name).await?,
            "preview" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read preview: {e}")))?;
                // Browsers send an empty part for an unused file input.
                if !data.is_empty() {
                    submission.new_previews.push(data);
                }
            }
            "remove_preview" => {
                let id = text(field, &name).await?;
                if !id.trim().is_empty() {
                    submission.removed_previews.push(id);
                }
            }
            _ => {}
        }
    }

    submission.theme_id = theme_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("theme_id is required"))?;
    let target_version =
        target_version.ok_or_else(|| ApiError::bad_request("commit_id is required"))?;
    submission.target_version = target_version
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("'{target_version}' is not a commit version")))?;

    Ok(submission)
}

/// POST /themes/commit - Publish a new version of a theme, creating it on version 1
pub async fn post_commit(
    RequireUser(user_id): RequireUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let submission = parse_commit_form(&mut multipart).await?;

    // The store transaction holds the connection lock while previews are written.
    let store = state.store.clone();
    let theme = tokio::task::spawn_blocking(move || {
        submit_commit(store.as_ref(), &user_id, submission)
    })
    .await
    .map_err(|e| {
        tracing::error!("Commit task failed: {e}");
        ApiError::internal("Commit could not be completed")
    })??;
    let location = format!("/api/v1/themes/{}", theme.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ApiResponse::success(theme)),
    ))
}
