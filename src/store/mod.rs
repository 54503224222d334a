mod schema;
mod sqlite;

pub use sqlite::{SqliteStore, SqliteTransaction};

use crate::error::Result;
use crate::types::*;

/// Repository defines the theme, commit and preview operations.
///
/// Implementations do no cross-entity validation; the commit orchestrator
/// checks every invariant before it writes.
pub trait Repository {
    // Theme operations
    fn create_theme(&self, theme: &Theme) -> Result<()>;
    fn get_theme(&self, id: &str) -> Result<Option<Theme>>;
    fn list_themes(&self) -> Result<Vec<Theme>>;
    fn list_themes_by_admin(&self, user_id: &str) -> Result<Vec<Theme>>;
    fn update_theme(&self, theme: &Theme) -> Result<()>;
    fn set_latest_commit_version(&self, theme_id: &str, version: i64) -> Result<()>;
    fn delete_theme(&self, id: &str) -> Result<bool>;

    // Theme admin operations (many-to-many)
    fn add_theme_admin(&self, theme_id: &str, user_id: &str) -> Result<()>;
    fn remove_theme_admin(&self, theme_id: &str, user_id: &str) -> Result<bool>;

    // Commit log operations (append-only)
    fn append_commit(&self, commit: &Commit) -> Result<()>;
    fn get_commit(&self, theme_id: &str, version: i64) -> Result<Option<Commit>>;
    fn list_commits(&self, theme_id: &str) -> Result<Vec<Commit>>;

    // Preview image operations
    fn add_preview_image(&self, image: &PreviewImage) -> Result<()>;
    fn get_preview_image(&self, id: &str) -> Result<Option<PreviewImage>>;
    fn delete_preview_image(&self, id: &str) -> Result<bool>;
}

/// A repository view whose writes only become visible on `commit`.
/// Dropping it without committing rolls everything back.
pub trait Transaction: Repository {
    fn repository(&self) -> &dyn Repository;
    fn commit(self: Box<Self>) -> Result<()>;
}

/// Store is the shared, auto-committing database handle.
pub trait Store: Repository + Send + Sync {
    fn initialize(&self) -> Result<()>;

    /// Starts a serializable transaction. Concurrent writers wait for it to finish.
    fn begin(&self) -> Result<Box<dyn Transaction + '_>>;
}

/// Runs `work` as one unit: committed if it returns Ok, rolled back otherwise.
pub fn unit_of_work<T, F>(store: &dyn Store, work: F) -> Result<T>
where
    F: FnOnce(&dyn Repository) -> Result<T>,
{
    let tx = store.begin()?;
    let value = work(tx.repository())?;
    tx.commit()?;
    Ok(value)
}
