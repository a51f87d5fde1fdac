//! Database schema and migrations for cove.
//!
//! Migrations are applied sequentially when the database is opened.
//! The schema_version table tracks which migrations have been applied.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: folders table
    r#"
-- Folder hierarchy; parent_id 0 means root, owner_user_id 0 means no owner
CREATE TABLE folders (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id       INTEGER NOT NULL DEFAULT 0,
    name            TEXT NOT NULL,
    owner_user_id   INTEGER NOT NULL DEFAULT 0,
    is_private      INTEGER NOT NULL DEFAULT 0,
    created_by      INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_folders_parent_id ON folders(parent_id);
CREATE INDEX idx_folders_owner_user_id ON folders(owner_user_id);
"#,
    // v2: files table
    r#"
-- File records; bytes live in blob storage under {root}/{folder_id}/{stored_name}
CREATE TABLE files (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    folder_id           INTEGER NOT NULL,
    original_name       TEXT NOT NULL,
    stored_name         TEXT NOT NULL,
    mime_type           TEXT NOT NULL DEFAULT 'application/octet-stream',
    size                INTEGER NOT NULL DEFAULT 0,
    content_hash        TEXT,
    uploader_user_id    INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_folder_id ON files(folder_id);
CREATE INDEX idx_files_uploader_user_id ON files(uploader_user_id);
"#,
    // v3: permissions table
    r#"
-- Grants: subject (role or user) -> capability on an entity (folder or file).
-- The write path only stores 'view'; 'manage' is derived from ownership/admin.
CREATE TABLE permissions (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type     TEXT NOT NULL,
    entity_id       INTEGER NOT NULL,
    subject_type    TEXT NOT NULL,
    subject_key     TEXT NOT NULL,
    capability      TEXT NOT NULL,
    created_by      INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_permissions_entity ON permissions(entity_type, entity_id);
CREATE INDEX idx_permissions_subject ON permissions(subject_type, subject_key);
CREATE INDEX idx_permissions_capability ON permissions(capability);
"#,
    // v4: activity table
    r#"
CREATE TABLE activity (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    actor_user_id   INTEGER NOT NULL DEFAULT 0,
    action          TEXT NOT NULL,
    entity_type     TEXT NOT NULL,
    entity_id       INTEGER NOT NULL,
    meta            TEXT,
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_activity_actor_user_id ON activity(actor_user_id);
CREATE INDEX idx_activity_entity ON activity(entity_type, entity_id);
CREATE INDEX idx_activity_created_at ON activity(created_at);
"#,
];
