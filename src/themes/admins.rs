use crate::error::{Error, Result};
use crate::store::{Store, unit_of_work};

/// Grants `user_id` commit rights on an existing theme. Granting twice is a no-op.
pub fn add_admin(store: &dyn Store, theme_id: &str, user_id: &str) -> Result<()> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(Error::invalid("User id cannot be empty"));
    }

    unit_of_work(store, |repo| {
        repo.get_theme(theme_id)?.ok_or(Error::NotFound)?;
        repo.add_theme_admin(theme_id, user_id)
    })?;

    tracing::info!(theme_id, user_id, "Granted theme admin");
    Ok(())
}

/// Revokes `user_id`'s commit rights. A theme always keeps at least one admin.
pub fn remove_admin(store: &dyn Store, theme_id: &str, user_id: &str) -> Result<()> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(Error::invalid("User id cannot be empty"));
    }

    unit_of_work(store, |repo| {
        let theme = repo.get_theme(theme_id)?.ok_or(Error::NotFound)?;
        if !theme.is_admin(user_id) {
            return Err(Error::NotFound);
        }
        if theme.admins.len() == 1 {
            return Err(Error::invalid(format!(
                "Cannot remove {user_id}: they are the last admin of {theme_id}"
            )));
        }
        repo.remove_theme_admin(theme_id, user_id)?;
        Ok(())
    })?;

    tracing::info!(theme_id, user_id, "Revoked theme admin");
    Ok(())
}

/// Deletes a theme with its whole commit history, previews and admin set.
pub fn delete_theme(store: &dyn Store, theme_id: &str) -> Result<()> {
    if !store.delete_theme(theme_id)? {
        return Err(Error::NotFound);
    }
    tracing::info!(theme_id, "Deleted theme");
    Ok(())
}
