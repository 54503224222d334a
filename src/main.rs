use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use themeshelf::cli::{
    AdminCommands, run_add_admin, run_delete_theme, run_init, run_issue_token, run_list_themes,
    run_remove_admin,
};
use themeshelf::config::{AuthConfig, DEFAULT_SESSION_HOURS, ServerConfig};
use themeshelf::server::{AppState, create_router};
use themeshelf::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "themeshelf")]
#[command(about = "A hosting server for versioned user stylesheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database and token secret
        #[arg(long, env = "THEMESHELF_DATA_DIR", default_value = "./data")]
        data_dir: PathBuf,

        /// Secret used to sign session tokens, overrides the secret file
        #[arg(long, env = "TOKEN_SECRET", hide_env_values = true)]
        token_secret: Option<String>,

        /// Hours a login session stays valid
        #[arg(long, default_value_t = DEFAULT_SESSION_HOURS)]
        session_hours: i64,

        /// Drop the Secure attribute from session cookies (plain-HTTP development only)
        #[arg(long)]
        insecure_cookies: bool,
    },
}

async fn serve(config: ServerConfig, auth: AuthConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let state = AppState::new(Arc::new(store), &auth)?.with_secure_cookies(config.secure_cookies);
    if !config.secure_cookies {
        tracing::warn!("Session cookies are not marked Secure");
    }

    let app = create_router(Arc::new(state));
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("themeshelf=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init { data_dir } => run_init(data_dir)?,
            AdminCommands::IssueToken {
                data_dir,
                user,
                hours,
                token_secret,
            } => run_issue_token(data_dir, user, hours, token_secret)?,
            AdminCommands::ListThemes {
                data_dir,
                admin,
                json,
            } => run_list_themes(data_dir, admin, json)?,
            AdminCommands::AddAdmin {
                data_dir,
                theme,
                user,
            } => run_add_admin(data_dir, theme, user)?,
            AdminCommands::RemoveAdmin {
                data_dir,
                theme,
                user,
            } => run_remove_admin(data_dir, theme, user)?,
            AdminCommands::DeleteTheme {
                data_dir,
                theme,
                yes,
            } => run_delete_theme(data_dir, theme, yes)?,
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            token_secret,
            session_hours,
            insecure_cookies,
        } => {
            if session_hours <= 0 {
                anyhow::bail!("--session-hours must be positive");
            }

            let config = ServerConfig {
                host,
                port,
                data_dir,
                secure_cookies: !insecure_cookies,
            };
            let auth = AuthConfig::resolve(token_secret.as_deref(), &config.secret_path())?
                .with_session_lifetime(Duration::hours(session_hours));

            serve(config, auth).await?;
        }
    }

    Ok(())
}
