mod admin;
mod commands;

pub use admin::{
    run_add_admin, run_delete_theme, run_init, run_issue_token, run_list_themes,
    run_remove_admin,
};
pub use commands::AdminCommands;

use std::io::IsTerminal;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::config::ServerConfig;
use crate::store::SqliteStore;

/// Open the store in an initialized data directory
pub fn init_store(data_dir: &Path) -> anyhow::Result<SqliteStore> {
    let config = ServerConfig {
        data_dir: data_dir.to_path_buf(),
        ..ServerConfig::default()
    };
    let db_path = config.db_path();

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'themeshelf admin init' first.",
            db_path.display()
        );
    }

    SqliteStore::new(&db_path).map_err(Into::into)
}

pub fn confirm_action(message: &str, yes: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if !std::io::stdin().is_terminal() {
        anyhow::bail!("--yes is required for destructive operations in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message)
            .with_default(false)
            .prompt()?)
    }
}

pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let diff = Utc::now().signed_duration_since(*dt);

    if diff.num_seconds() < 0 {
        return "in the future".to_string();
    }
    if diff.num_seconds() < 60 {
        return "just now".to_string();
    }

    let (amount, unit) = if diff.num_minutes() < 60 {
        (diff.num_minutes(), "minute")
    } else if diff.num_hours() < 24 {
        (diff.num_hours(), "hour")
    } else {
        (diff.num_days(), "day")
    };

    if amount == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{amount} {unit}s ago")
    }
}
