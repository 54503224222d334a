use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use super::preview::{PreviewInfo, inspect_preview};
use super::validation::*;
use crate::error::{Error, Result};
use crate::store::{Repository, Store, unit_of_work};
use crate::types::{Commit, PreviewImage, Theme};

/// Everything a client sends to publish a new version of a theme.
#[derive(Debug, Clone, Default)]
pub struct CommitSubmission {
    pub theme_id: String,
    /// Must be the theme's current latest version plus one, or 1 for a new theme.
    pub target_version: i64,
    pub name: String,
    pub description: String,
    pub content: String,
    pub message: String,
    pub new_previews: Vec<Bytes>,
    pub removed_previews: Vec<String>,
}

struct AcceptedPreview {
    info: PreviewInfo,
    data: Bytes,
}

/// Validates a submission and applies it as a single transaction.
///
/// Syntactic checks (id, field lengths, preview formats) run before the
/// transaction opens. Everything that depends on stored state runs inside it,
/// so two writers racing for the same version cannot both succeed. Any error
/// leaves the store exactly as it was.
pub fn submit_commit(
    store: &dyn Store,
    actor: &str,
    submission: CommitSubmission,
) -> Result<Theme> {
    if actor.is_empty() {
        return Err(Error::Unauthenticated);
    }

    validate_theme_id(&submission.theme_id)?;
    validate_name(&submission.name)?;
    validate_description(&submission.description)?;
    validate_content(&submission.content)?;
    validate_message(&submission.message)?;

    let new_previews = submission
        .new_previews
        .iter()
        .map(|data| {
            inspect_preview(data).map(|info| AcceptedPreview {
                info,
                data: data.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut removed_previews = Vec::with_capacity(submission.removed_previews.len());
    for raw in &submission.removed_previews {
        let id = parse_preview_id(raw)?;
        if !removed_previews.contains(&id) {
            removed_previews.push(id);
        }
    }

    let theme = unit_of_work(store, |repo| {
        apply_submission(repo, actor, &submission, &new_previews, &removed_previews)
    })
    .inspect_err(|e| {
        tracing::debug!(
            theme_id = %submission.theme_id,
            version = submission.target_version,
            "Commit rejected: {e}"
        );
    })?;

    tracing::info!(
        theme_id = %theme.id,
        version = submission.target_version,
        actor,
        added_previews = new_previews.len(),
        removed_previews = removed_previews.len(),
        "Committed theme"
    );

    Ok(theme)
}

fn apply_submission(
    repo: &dyn Repository,
    actor: &str,
    submission: &CommitSubmission,
    new_previews: &[AcceptedPreview],
    removed_previews: &[String],
) -> Result<Theme> {
    let theme_id = submission.theme_id.as_str();
    let existing = repo.get_theme(theme_id)?;

    match &existing {
        None if submission.target_version != 1 => return Err(Error::NotFound),
        Some(theme) if submission.target_version != theme.next_version() => {
            return Err(Error::VersionConflict {
                submitted: submission.target_version,
            });
        }
        Some(theme) if !theme.is_admin(actor) => return Err(Error::Forbidden),
        _ => {}
    }

    let current_previews = existing
        .as_ref()
        .map(|theme| theme.previews.as_slice())
        .unwrap_or_default();

    if let Some(id) = removed_previews
        .iter()
        .find(|id| !current_previews.contains(id))
    {
        return Err(Error::invalid(format!(
            "Preview {id} does not belong to theme {theme_id}"
        )));
    }

    let requested = current_previews.len() - removed_previews.len() + new_previews.len();
    if requested > MAX_PREVIEW_COUNT {
        return Err(Error::QuotaExceeded {
            limit: MAX_PREVIEW_COUNT,
            requested,
        });
    }

    match existing {
        None => {
            repo.create_theme(&Theme {
                id: theme_id.to_string(),
                name: submission.name.clone(),
                description: submission.description.clone(),
                latest_commit_version: None,
                latest_commit: None,
                admins: Vec::new(),
                previews: Vec::new(),
            })?;
            repo.add_theme_admin(theme_id, actor)?;
        }
        Some(theme)
            if theme.name != submission.name || theme.description != submission.description =>
        {
            repo.update_theme(&Theme {
                name: submission.name.clone(),
                description: submission.description.clone(),
                ..theme
            })?;
        }
        Some(_) => {}
    }

    let now = Utc::now();

    repo.append_commit(&Commit {
        theme_id: theme_id.to_string(),
        version: submission.target_version,
        message: submission.message.clone(),
        created_at: now,
        created_by: actor.to_string(),
        content: submission.content.clone(),
    })?;
    repo.set_latest_commit_version(theme_id, submission.target_version)?;

    for preview in new_previews {
        repo.add_preview_image(&PreviewImage {
            id: Uuid::new_v4().to_string(),
            theme_id: theme_id.to_string(),
            created_at: now,
            created_by: actor.to_string(),
            width: preview.info.width,
            height: preview.info.height,
            mime_type: preview.info.mime_type.to_string(),
            content: preview.data.to_vec(),
        })?;
    }

    for id in removed_previews {
        repo.delete_preview_image(id)?;
    }

    repo.get_theme(theme_id)?.ok_or(Error::NotFound)
}
