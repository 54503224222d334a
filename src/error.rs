use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("version conflict: version {submitted} is not the next version of this theme")]
    VersionConflict { submitted: i64 },

    #[error("quota exceeded: {requested} previews requested, limit is {limit}")]
    QuotaExceeded { limit: usize, requested: usize },
}

impl Error {
    /// Storage failures may be transient; every other error needs the caller
    /// to change something before trying again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Database(_))
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
