use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::Duration;

use crate::error::{Error, Result};

pub const SECRET_FILE_NAME: &str = ".token_secret";
pub const DEFAULT_SESSION_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Marks the session cookie `Secure`. Only disable for plain-HTTP local setups.
    pub secure_cookies: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("themeshelf.db")
    }

    #[must_use]
    pub fn secret_path(&self) -> PathBuf {
        self.data_dir.join(SECRET_FILE_NAME)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            secure_cookies: true,
        }
    }
}

/// Signing configuration for session tokens.
#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Vec<u8>,
    pub session_lifetime: Duration,
}

impl AuthConfig {
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            session_lifetime: Duration::hours(DEFAULT_SESSION_HOURS),
        }
    }

    #[must_use]
    pub fn with_session_lifetime(mut self, lifetime: Duration) -> Self {
        self.session_lifetime = lifetime;
        self
    }

    /// Picks the explicit secret if one was given, otherwise the secret file.
    /// Having neither is an error: the server must not run unauthenticated.
    pub fn resolve(explicit: Option<&str>, secret_file: &Path) -> Result<Self> {
        if let Some(secret) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
            return Ok(Self::new(secret.as_bytes()));
        }

        match fs::read_to_string(secret_file) {
            Ok(contents) if !contents.trim().is_empty() => Ok(Self::new(contents.trim().as_bytes())),
            Ok(_) => Err(Error::Config(format!(
                "token secret file {} is empty",
                secret_file.display()
            ))),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::Config(format!(
                "no token secret configured: set TOKEN_SECRET or run 'themeshelf admin init' to create {}",
                secret_file.display()
            ))),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("session_lifetime", &self.session_lifetime)
            .finish()
    }
}
