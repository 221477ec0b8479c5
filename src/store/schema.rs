//! Database schema and migrations for the blob store.
//!
//! Migrations are applied sequentially when the store is opened. The
//! schema version is the number of applied migrations.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: files and folders collections
    r#"
-- Stored files. Payload and content type never change after insert.
CREATE TABLE IF NOT EXISTS files (
    id            TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    name          TEXT NOT NULL,               -- original file name
    content_type  TEXT NOT NULL DEFAULT '',
    content       BLOB NOT NULL,
    uploaded_at   INTEGER NOT NULL,            -- epoch milliseconds
    folder_id     TEXT                         -- NULL = root, not a foreign key
);

-- Folders. Names are not unique.
CREATE TABLE IF NOT EXISTS folders (
    id          TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    name        TEXT NOT NULL,
    created_at  INTEGER NOT NULL               -- epoch milliseconds
);
"#,
    // v2: secondary index for folder membership lookups
    r#"
CREATE INDEX IF NOT EXISTS idx_files_folder_id ON files(folder_id);
"#,
];

/// Current schema version.
pub const SCHEMA_VERSION: i64 = MIGRATIONS.len() as i64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
        assert_eq!(SCHEMA_VERSION, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_first_migration_creates_collections() {
        let first = MIGRATIONS[0];
        assert!(first.contains("CREATE TABLE IF NOT EXISTS files"));
        assert!(first.contains("CREATE TABLE IF NOT EXISTS folders"));
        assert!(first.contains("folder_id"));
        assert!(!first.contains("REFERENCES"));
    }

    #[test]
    fn test_second_migration_creates_folder_index() {
        assert!(MIGRATIONS[1].contains("idx_files_folder_id"));
    }

    #[test]
    fn test_migrations_are_idempotent_sql() {
        for migration in MIGRATIONS {
            assert!(!migration.trim().is_empty());
            assert!(migration.contains("IF NOT EXISTS"));
        }
    }
}
