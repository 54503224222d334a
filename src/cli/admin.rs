use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::auth::TokenCodec;
use crate::config::{AuthConfig, ServerConfig};
use crate::store::{Repository, SqliteStore, Store};
use crate::themes::admins;
use crate::types::Theme;

use super::{confirm_action, format_relative_time, init_store};

const SECRET_BYTES: usize = 32;

#[derive(Serialize)]
struct ThemeOutput {
    id: String,
    name: String,
    latest_version: Option<i64>,
    updated_at: Option<String>,
    admins: Vec<String>,
    previews: usize,
}

impl From<&Theme> for ThemeOutput {
    fn from(theme: &Theme) -> Self {
        Self {
            id: theme.id.clone(),
            name: theme.name.clone(),
            latest_version: theme.latest_commit_version,
            updated_at: theme
                .latest_commit
                .as_ref()
                .map(|commit| commit.created_at.to_rfc3339()),
            admins: theme.admins.clone(),
            previews: theme.previews.len(),
        }
    }
}

fn config_for(data_dir: &Path) -> ServerConfig {
    ServerConfig {
        data_dir: data_dir.to_path_buf(),
        ..ServerConfig::default()
    }
}

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

pub fn run_init(data_dir: PathBuf) -> anyhow::Result<()> {
    fs::create_dir_all(&data_dir)?;
    let config = config_for(&data_dir);

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;
    println!("Database ready at {}", config.db_path().display());

    let secret_file = config.secret_path();
    if secret_file.exists() {
        println!(
            "Token secret already exists at {}, leaving it unchanged.",
            secret_file.display()
        );
        return Ok(());
    }

    let secret: [u8; SECRET_BYTES] = rand::random();
    fs::write(&secret_file, hex::encode(secret))?;

    #[cfg(unix)]
    set_restrictive_permissions(&secret_file);

    println!("Token secret written to {}", secret_file.display());
    Ok(())
}

pub fn run_issue_token(
    data_dir: PathBuf,
    user: String,
    hours: i64,
    token_secret: Option<String>,
) -> anyhow::Result<()> {
    if hours <= 0 {
        anyhow::bail!("--hours must be positive");
    }

    let config = config_for(&data_dir);
    let auth = AuthConfig::resolve(token_secret.as_deref(), &config.secret_path())?;
    let codec = TokenCodec::new(&auth)?;

    let expiry = Utc::now() + Duration::hours(hours);
    let token = codec.issue(user.trim(), expiry)?;

    eprintln!("Token for {} expires {}", user.trim(), expiry.to_rfc3339());
    println!("{token}");
    Ok(())
}

fn print_themes_list(themes: &[Theme]) {
    if themes.is_empty() {
        println!("No themes found.");
        return;
    }
    println!();
    for theme in themes {
        let version = theme
            .latest_commit_version
            .map_or_else(|| "-".to_string(), |v| format!("v{v}"));
        let updated = theme
            .latest_commit
            .as_ref()
            .map_or_else(|| "never".to_string(), |c| format_relative_time(&c.created_at));
        println!(
            "  {}  {}  {}  updated {}  admins: {}",
            theme.id,
            version,
            theme.name,
            updated,
            theme.admins.join(", ")
        );
    }
    println!();
}

pub fn run_list_themes(data_dir: PathBuf, admin: Option<String>, json: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let themes = match admin {
        Some(user) => store.list_themes_by_admin(&user)?,
        None => store.list_themes()?,
    };

    if json {
        let output: Vec<ThemeOutput> = themes.iter().map(ThemeOutput::from).collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_themes_list(&themes);
    }
    Ok(())
}

pub fn run_add_admin(data_dir: PathBuf, theme: String, user: String) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    admins::add_admin(&store, &theme, &user)?;
    println!("Added {} as admin of '{theme}'", user.trim());
    Ok(())
}

pub fn run_remove_admin(data_dir: PathBuf, theme: String, user: String) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;
    admins::remove_admin(&store, &theme, &user)?;
    println!("Removed {} from admins of '{theme}'", user.trim());
    Ok(())
}

pub fn run_delete_theme(data_dir: PathBuf, theme: String, yes: bool) -> anyhow::Result<()> {
    let store = init_store(&data_dir)?;

    let Some(existing) = store.get_theme(&theme)? else {
        anyhow::bail!("Theme '{theme}' not found");
    };

    let commits = existing.latest_commit_version.unwrap_or(0);
    let message = format!(
        "Delete theme '{theme}' with {commits} commit(s) and {} preview(s)?",
        existing.previews.len()
    );
    if !confirm_action(&message, yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    admins::delete_theme(&store, &theme)?;
    println!("Deleted theme '{theme}'");
    Ok(())
}
