pub const SCHEMA: &str = r#"
-- Themes; the latest pointer must name a commit of the same theme
CREATE TABLE IF NOT EXISTS themes (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    latest_commit_version INTEGER,   -- NULL only while the first commit is being written
    created_at TEXT DEFAULT (datetime('now')),

    FOREIGN KEY (id, latest_commit_version) REFERENCES commits(theme_id, version)
);

-- Immutable stylesheet snapshots, one gap-free version sequence per theme
CREATE TABLE IF NOT EXISTS commits (
    theme_id TEXT NOT NULL REFERENCES themes(id) ON DELETE CASCADE,
    version INTEGER NOT NULL CHECK (version >= 1),
    message TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    created_by TEXT NOT NULL,
    content TEXT NOT NULL,
    PRIMARY KEY (theme_id, version)
);

-- Users allowed to commit to a theme (many-to-many)
CREATE TABLE IF NOT EXISTS theme_admins (
    theme_id TEXT NOT NULL REFERENCES themes(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    PRIMARY KEY (theme_id, user_id)
);

-- Preview screenshots, removed outright on delete
CREATE TABLE IF NOT EXISTS preview_images (
    id TEXT PRIMARY KEY,
    theme_id TEXT NOT NULL REFERENCES themes(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    created_by TEXT NOT NULL,
    width INTEGER NOT NULL,
    height INTEGER NOT NULL,
    mime_type TEXT NOT NULL,
    content BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_theme_admins_user ON theme_admins(user_id);
CREATE INDEX IF NOT EXISTS idx_preview_images_theme ON preview_images(theme_id);
"#;
