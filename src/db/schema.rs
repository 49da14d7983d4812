//! Database schema and migrations for Stowage.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email       TEXT,
    role        TEXT NOT NULL DEFAULT 'user',  -- 'owner', 'admin', 'user'
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_users_role ON users(role);
"#,
    // v2: Per-user limit overrides. NULL means "use the server default".
    r#"
CREATE TABLE user_limits (
    user_id              INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    files_limit          INTEGER,
    short_links_limit    INTEGER,
    max_storage_mb       INTEGER,
    max_upload_mb        INTEGER,
    allow_remote_upload  INTEGER,
    updated_at           TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v3: Admin-editable server settings (single row)
    r#"
CREATE TABLE server_settings (
    id                       INTEGER PRIMARY KEY CHECK (id = 1),
    max_upload_mb            INTEGER DEFAULT 1024,
    max_files_per_upload     INTEGER DEFAULT 25,
    user_max_storage_mb      INTEGER DEFAULT 5120,
    admin_max_storage_mb     INTEGER DEFAULT 10240,
    user_daily_quota_mb      INTEGER DEFAULT 1024,
    admin_daily_quota_mb     INTEGER DEFAULT 2048,
    short_links_limit_user   INTEGER DEFAULT 50,
    short_links_limit_admin  INTEGER DEFAULT 100,
    files_limit_user         INTEGER DEFAULT 250,
    files_limit_admin        INTEGER DEFAULT 500,
    allow_remote_upload      INTEGER DEFAULT 0,
    updated_at               TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v4: Hosted resources
    r#"
CREATE TABLE files (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    original_name  TEXT NOT NULL,
    stored_name    TEXT NOT NULL,
    mime_type      TEXT NOT NULL,
    size           INTEGER NOT NULL,  -- bytes
    created_at     TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_user_id ON files(user_id);
CREATE INDEX idx_files_user_created ON files(user_id, created_at);

CREATE TABLE short_links (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    original_url  TEXT NOT NULL,
    slug          TEXT NOT NULL UNIQUE,
    created_at    TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_short_links_user_id ON short_links(user_id);
"#,
    // v5: Outgoing mail queue drained by the external mailer
    r#"
CREATE TABLE mail_outbox (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    recipient   TEXT NOT NULL,
    subject     TEXT NOT NULL,
    body        TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    sent_at     TEXT
);

CREATE INDEX idx_mail_outbox_pending ON mail_outbox(sent_at);
"#,
];
