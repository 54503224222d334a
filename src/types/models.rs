use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub name: String,
    pub description: String,
    /// `None` only between theme creation and the first commit, which happen
    /// in the same transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_commit_version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_commit: Option<Commit>,
    pub admins: Vec<String>,
    pub previews: Vec<String>,
}

impl Theme {
    #[must_use]
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admins.iter().any(|admin| admin == user_id)
    }

    /// The version a new commit must carry to be accepted.
    #[must_use]
    pub fn next_version(&self) -> i64 {
        self.latest_commit_version.unwrap_or(0) + 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub theme_id: String,
    pub version: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewImage {
    pub id: String,
    pub theme_id: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    #[serde(skip)]
    pub content: Vec<u8>,
}
