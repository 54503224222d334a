use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Initialize the data directory (create database and token secret)
    Init {
        /// Data directory for the database and token secret
        #[arg(long, env = "THEMESHELF_DATA_DIR", default_value = "./data")]
        data_dir: PathBuf,
    },

    /// Mint a session token for a user, bypassing the identity provider
    IssueToken {
        /// Data directory for the database and token secret
        #[arg(long, env = "THEMESHELF_DATA_DIR", default_value = "./data")]
        data_dir: PathBuf,

        /// User ID the token identifies
        #[arg(long)]
        user: String,

        /// Hours until the token expires
        #[arg(long, default_value = "24")]
        hours: i64,

        /// Secret used to sign the token, overrides the secret file
        #[arg(long, env = "TOKEN_SECRET", hide_env_values = true)]
        token_secret: Option<String>,
    },

    /// List themes
    ListThemes {
        /// Data directory for the database and token secret
        #[arg(long, env = "THEMESHELF_DATA_DIR", default_value = "./data")]
        data_dir: PathBuf,

        /// Only themes administered by this user
        #[arg(long)]
        admin: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Grant a user commit rights on a theme
    AddAdmin {
        /// Data directory for the database and token secret
        #[arg(long, env = "THEMESHELF_DATA_DIR", default_value = "./data")]
        data_dir: PathBuf,

        /// Theme ID
        #[arg(long)]
        theme: String,

        /// User ID to grant
        #[arg(long)]
        user: String,
    },

    /// Revoke a user's commit rights on a theme
    RemoveAdmin {
        /// Data directory for the database and token secret
        #[arg(long, env = "THEMESHELF_DATA_DIR", default_value = "./data")]
        data_dir: PathBuf,

        /// Theme ID
        #[arg(long)]
        theme: String,

        /// User ID to revoke
        #[arg(long)]
        user: String,
    },

    /// Delete a theme with its history and previews
    DeleteTheme {
        /// Data directory for the database and token secret
        #[arg(long, env = "THEMESHELF_DATA_DIR", default_value = "./data")]
        data_dir: PathBuf,

        /// Theme ID to delete
        #[arg(long)]
        theme: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}
