use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};

use rusqlite::Connection;

use super::schema::SCHEMA;
use super::{Repository, Store, Transaction};
use crate::error::Result;
use crate::types::*;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn()
    }
}

/// An open `BEGIN IMMEDIATE` transaction. Holds the connection for its whole
/// lifetime, so other writers queue behind it.
pub struct SqliteTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::error!("Failed to roll back transaction: {e}");
            }
        }
    }
}

impl Transaction for SqliteTransaction<'_> {
    fn repository(&self) -> &dyn Repository {
        self
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn begin(&self) -> Result<Box<dyn Transaction + '_>> {
        let conn = self.conn();
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Box::new(SqliteTransaction {
            conn,
            finished: false,
        }))
    }
}

impl Repository for SqliteStore {
    fn create_theme(&self, theme: &Theme) -> Result<()> {
        sql::create_theme(&self.conn(), theme)
    }

    fn get_theme(&self, id: &str) -> Result<Option<Theme>> {
        sql::get_theme(&self.conn(), id)
    }

    fn list_themes(&self) -> Result<Vec<Theme>> {
        sql::list_themes(&self.conn())
    }

    fn list_themes_by_admin(&self, user_id: &str) -> Result<Vec<Theme>> {
        sql::list_themes_by_admin(&self.conn(), user_id)
    }

    fn update_theme(&self, theme: &Theme) -> Result<()> {
        sql::update_theme(&self.conn(), theme)
    }

    fn set_latest_commit_version(&self, theme_id: &str, version: i64) -> Result<()> {
        sql::set_latest_commit_version(&self.conn(), theme_id, version)
    }

    fn delete_theme(&self, id: &str) -> Result<bool> {
        sql::delete_theme(&self.conn(), id)
    }

    fn add_theme_admin(&self, theme_id: &str, user_id: &str) -> Result<()> {
        sql::add_theme_admin(&self.conn(), theme_id, user_id)
    }

    fn remove_theme_admin(&self, theme_id: &str, user_id: &str) -> Result<bool> {
        sql::remove_theme_admin(&self.conn(), theme_id, user_id)
    }

    fn append_commit(&self, commit: &Commit) -> Result<()> {
        sql::append_commit(&self.conn(), commit)
    }

    fn get_commit(&self, theme_id: &str, version: i64) -> Result<Option<Commit>> {
        sql::get_commit(&self.conn(), theme_id, version)
    }

    fn list_commits(&self, theme_id: &str) -> Result<Vec<Commit>> {
        sql::list_commits(&self.conn(), theme_id)
    }

    fn add_preview_image(&self, image: &PreviewImage) -> Result<()> {
        sql::add_preview_image(&self.conn(), image)
    }

    fn get_preview_image(&self, id: &str) -> Result<Option<PreviewImage>> {
        sql::get_preview_image(&self.conn(), id)
    }

    fn delete_preview_image(&self, id: &str) -> Result<bool> {
        sql::delete_preview_image(&self.conn(), id)
    }
}

impl Repository for SqliteTransaction<'_> {
    fn create_theme(&self, theme: &Theme) -> Result<()> {
        sql::create_theme(&self.conn, theme)
    }

    fn get_theme(&self, id: &str) -> Result<Option<Theme>> {
        sql::get_theme(&self.conn, id)
    }

    fn list_themes(&self) -> Result<Vec<Theme>> {
        sql::list_themes(&self.conn)
    }

    fn list_themes_by_admin(&self, user_id: &str) -> Result<Vec<Theme>> {
        sql::list_themes_by_admin(&self.conn, user_id)
    }

    fn update_theme(&self, theme: &Theme) -> Result<()> {
        sql::update_theme(&self.conn, theme)
    }

    fn set_latest_commit_version(&self, theme_id: &str, version: i64) -> Result<()> {
        sql::set_latest_commit_version(&self.conn, theme_id, version)
    }

    fn delete_theme(&self, id: &str) -> Result<bool> {
        sql::delete_theme(&self.conn, id)
    }

    fn add_theme_admin(&self, theme_id: &str, user_id: &str) -> Result<()> {
        sql::add_theme_admin(&self.conn, theme_id, user_id)
    }

    fn remove_theme_admin(&self, theme_id: &str, user_id: &str) -> Result<bool> {
        sql::remove_theme_admin(&self.conn, theme_id, user_id)
    }

    fn append_commit(&self, commit: &Commit) -> Result<()> {
        sql::append_commit(&self.conn, commit)
    }

    fn get_commit(&self, theme_id: &str, version: i64) -> Result<Option<Commit>> {
        sql::get_commit(&self.conn, theme_id, version)
    }

    fn list_commits(&self, theme_id: &str) -> Result<Vec<Commit>> {
        sql::list_commits(&self.conn, theme_id)
    }

    fn add_preview_image(&self, image: &PreviewImage) -> Result<()> {
        sql::add_preview_image(&self.conn, image)
    }

    fn get_preview_image(&self, id: &str) -> Result<Option<PreviewImage>> {
        sql::get_preview_image(&self.conn, id)
    }

    fn delete_preview_image(&self, id: &str) -> Result<bool> {
        sql::delete_preview_image(&self.conn, id)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Statements shared by the auto-commit store and open transactions.
mod sql {
    use rusqlite::{Connection, OptionalExtension, Row, ffi, params};

    use super::{format_datetime, parse_datetime};
    use crate::error::{Error, Result};
    use crate::types::*;

    const THEME_SELECT: &str = "
        SELECT t.id, t.name, t.description, t.latest_commit_version,
               c.version, c.message, c.created_at, c.created_by, c.content
        FROM themes t
        LEFT JOIN commits c ON c.theme_id = t.id AND c.version = t.latest_commit_version";

    fn is_duplicate_key(e: &rusqlite::Error) -> bool {
        matches!(
            e,
            rusqlite::Error::SqliteFailure(err, _)
                if err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }

    fn theme_from_row(row: &Row<'_>) -> rusqlite::Result<Theme> {
        let latest_commit = match row.get::<_, Option<i64>>(4)? {
            Some(version) => Some(Commit {
                theme_id: row.get(0)?,
                version,
                message: row.get(5)?,
                created_at: parse_datetime(&row.get::<_, String>(6)?),
                created_by: row.get(7)?,
                content: row.get(8)?,
            }),
            None => None,
        };

        Ok(Theme {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            latest_commit_version: row.get(3)?,
            latest_commit,
            admins: Vec::new(),
            previews: Vec::new(),
        })
    }

    fn commit_from_row(row: &Row<'_>) -> rusqlite::Result<Commit> {
        Ok(Commit {
            theme_id: row.get(0)?,
            version: row.get(1)?,
            message: row.get(2)?,
            created_at: parse_datetime(&row.get::<_, String>(3)?),
            created_by: row.get(4)?,
            content: row.get(5)?,
        })
    }

    fn load_relations(conn: &Connection, mut theme: Theme) -> Result<Theme> {
        let mut stmt = conn
            .prepare("SELECT user_id FROM theme_admins WHERE theme_id = ?1 ORDER BY user_id")?;
        theme.admins = stmt
            .query_map(params![theme.id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        let mut stmt =
            conn.prepare("SELECT id FROM preview_images WHERE theme_id = ?1 ORDER BY rowid")?;
        theme.previews = stmt
            .query_map(params![theme.id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(theme)
    }

    fn query_themes(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Theme>> {
        let mut stmt = conn.prepare(sql)?;
        let themes = stmt
            .query_map(params, theme_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        themes
            .into_iter()
            .map(|theme| load_relations(conn, theme))
            .collect()
    }

    // Theme operations

    pub fn create_theme(conn: &Connection, theme: &Theme) -> Result<()> {
        let result = conn.execute(
            "INSERT INTO themes (id, name, description, latest_commit_version, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                theme.id,
                theme.name,
                theme.description,
                theme.latest_commit_version,
                format_datetime(&chrono::Utc::now()),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            // Someone else created the theme first, so their version 1 won.
            Err(e) if is_duplicate_key(&e) => Err(Error::VersionConflict {
                submitted: theme.next_version(),
            }),
            Err(e) => Err(Error::from(e)),
        }
    }

    pub fn get_theme(conn: &Connection, id: &str) -> Result<Option<Theme>> {
        let theme = conn
            .query_row(
                &format!("{THEME_SELECT} WHERE t.id = ?1"),
                params![id],
                theme_from_row,
            )
            .optional()?;

        theme.map(|theme| load_relations(conn, theme)).transpose()
    }

    pub fn list_themes(conn: &Connection) -> Result<Vec<Theme>> {
        query_themes(conn, &format!("{THEME_SELECT} ORDER BY t.id"), [])
    }

    pub fn list_themes_by_admin(conn: &Connection, user_id: &str) -> Result<Vec<Theme>> {
        query_themes(
            conn,
            &format!(
                "{THEME_SELECT}
                 INNER JOIN theme_admins a ON a.theme_id = t.id AND a.user_id = ?1
                 ORDER BY t.id"
            ),
            params![user_id],
        )
    }

    pub fn update_theme(conn: &Connection, theme: &Theme) -> Result<()> {
        let rows = conn.execute(
            "UPDATE themes SET name = ?1, description = ?2 WHERE id = ?3",
            params![theme.name, theme.description, theme.id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    pub fn set_latest_commit_version(conn: &Connection, theme_id: &str, version: i64) -> Result<()> {
        let rows = conn.execute(
            "UPDATE themes SET latest_commit_version = ?1 WHERE id = ?2",
            params![version, theme_id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    pub fn delete_theme(conn: &Connection, id: &str) -> Result<bool> {
        let rows = conn.execute("DELETE FROM themes WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Theme admin operations

    pub fn add_theme_admin(conn: &Connection, theme_id: &str, user_id: &str) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO theme_admins (theme_id, user_id) VALUES (?1, ?2)",
            params![theme_id, user_id],
        )?;
        Ok(())
    }

    pub fn remove_theme_admin(conn: &Connection, theme_id: &str, user_id: &str) -> Result<bool> {
        let rows = conn.execute(
            "DELETE FROM theme_admins WHERE theme_id = ?1 AND user_id = ?2",
            params![theme_id, user_id],
        )?;
        Ok(rows > 0)
    }

    // Commit log operations

    pub fn append_commit(conn: &Connection, commit: &Commit) -> Result<()> {
        let result = conn.execute(
            "INSERT INTO commits (theme_id, version, message, created_at, created_by, content)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                commit.theme_id,
                commit.version,
                commit.message,
                format_datetime(&commit.created_at),
                commit.created_by,
                commit.content,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(Error::VersionConflict {
                submitted: commit.version,
            }),
            Err(e) => Err(Error::from(e)),
        }
    }

    pub fn get_commit(conn: &Connection, theme_id: &str, version: i64) -> Result<Option<Commit>> {
        conn.query_row(
            "SELECT theme_id, version, message, created_at, created_by, content
             FROM commits WHERE theme_id = ?1 AND version = ?2",
            params![theme_id, version],
            commit_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    pub fn list_commits(conn: &Connection, theme_id: &str) -> Result<Vec<Commit>> {
        let mut stmt = conn.prepare(
            "SELECT theme_id, version, message, created_at, created_by, content
             FROM commits WHERE theme_id = ?1 ORDER BY version",
        )?;

        let rows = stmt.query_map(params![theme_id], commit_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Preview image operations

    pub fn add_preview_image(conn: &Connection, image: &PreviewImage) -> Result<()> {
        conn.execute(
            "INSERT INTO preview_images (id, theme_id, created_at, created_by, width, height, mime_type, content)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                image.id,
                image.theme_id,
                format_datetime(&image.created_at),
                image.created_by,
                image.width,
                image.height,
                image.mime_type,
                image.content,
            ],
        )?;
        Ok(())
    }

    pub fn get_preview_image(conn: &Connection, id: &str) -> Result<Option<PreviewImage>> {
        conn.query_row(
            "SELECT id, theme_id, created_at, created_by, width, height, mime_type, content
             FROM preview_images WHERE id = ?1",
            params![id],
            |row| {
                Ok(PreviewImage {
                    id: row.get(0)?,
                    theme_id: row.get(1)?,
                    created_at: parse_datetime(&row.get::<_, String>(2)?),
                    created_by: row.get(3)?,
                    width: row.get(4)?,
                    height: row.get(5)?,
                    mime_type: row.get(6)?,
                    content: row.get(7)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    pub fn delete_preview_image(conn: &Connection, id: &str) -> Result<bool> {
        let rows = conn.execute("DELETE FROM preview_images WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}
