//! Blob store for the file vault.
//!
//! Durable storage for file payloads and folder records in a single SQLite
//! database, with a secondary index on file folder membership. Every
//! mutation runs inside its own transaction.

mod file;
mod folder;
mod schema;

pub use file::{FileBlob, FileRepository, StoredFile};
pub use folder::{FolderRepository, StoredFolder};
pub use schema::{MIGRATIONS, SCHEMA_VERSION};

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{Result, VaultError};

/// Handle to the opened store.
///
/// Constructed once by the application and passed by reference to
/// consumers. Tests open an isolated in-memory instance per case.
pub struct BlobStore {
    pool: SqlitePool,
}

impl BlobStore {
    /// Open (or create) the store at the specified path.
    ///
    /// Missing tables and indexes are created and older layouts upgraded.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening blob store at {:?}", path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| VaultError::StorageUnavailable(e.to_string()))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        Self::connect(options).await
    }

    /// Open an in-memory store for testing.
    pub async fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory blob store");
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| VaultError::StorageUnavailable(e.to_string()))?;

        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self> {
        // One connection: a single writer context, and an in-memory database
        // lives exactly as long as its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| VaultError::StorageUnavailable(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the store, waiting for in-flight operations to finish.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Get the current schema version (0 for a fresh database).
    pub async fn schema_version(&self) -> Result<i64> {
        if !self.table_exists("schema_version").await? {
            return Ok(0);
        }

        let version: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| VaultError::ReadFailed(e.to_string()))?;

        Ok(version)
    }

    /// Apply pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        let current_version = self
            .schema_version()
            .await
            .map_err(|e| VaultError::StorageUnavailable(e.to_string()))?;

        if current_version >= SCHEMA_VERSION {
            debug!("Blob store is up to date (version {})", current_version);
            return Ok(());
        }

        info!(
            "Migrating blob store from version {} to {}",
            current_version, SCHEMA_VERSION
        );

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version     INTEGER PRIMARY KEY,
                applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| VaultError::StorageUnavailable(e.to_string()))?;

        for (i, migration) in MIGRATIONS.iter().enumerate().skip(current_version as usize) {
            let version = (i + 1) as i64;
            debug!("Applying migration v{}", version);

            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| VaultError::StorageUnavailable(e.to_string()))?;

            sqlx::raw_sql(migration)
                .execute(&mut *tx)
                .await
                .map_err(|e| VaultError::StorageUnavailable(e.to_string()))?;

            sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
                .bind(version)
                .execute(&mut *tx)
                .await
                .map_err(|e| VaultError::StorageUnavailable(e.to_string()))?;

            tx.commit()
                .await
                .map_err(|e| VaultError::StorageUnavailable(e.to_string()))?;
        }

        info!("Blob store migration complete (now at version {})", SCHEMA_VERSION);
        Ok(())
    }

    /// Check if a table exists.
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        self.schema_object_exists("table", table_name).await
    }

    /// Check if an index exists.
    pub async fn index_exists(&self, index_name: &str) -> Result<bool> {
        self.schema_object_exists("index", index_name).await
    }

    async fn schema_object_exists(&self, kind: &str, name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = ? AND name = ?)",
        )
        .bind(kind)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| VaultError::ReadFailed(e.to_string()))?;

        Ok(exists)
    }

    // Files

    /// Store a new file, returning its generated ID.
    pub async fn put_file(&self, blob: &FileBlob, folder_id: Option<&str>) -> Result<String> {
        FileRepository::new(&self.pool).create(blob, folder_id).await
    }

    /// Get a single file with its payload.
    pub async fn get_file(&self, id: &str) -> Result<Option<StoredFile>> {
        FileRepository::new(&self.pool).get_by_id(id).await
    }

    /// List every file. Callers must not rely on the order.
    pub async fn list_files(&self) -> Result<Vec<StoredFile>> {
        FileRepository::new(&self.pool).list().await
    }

    /// List the files in a folder, or the root files when `folder_id` is None.
    pub async fn list_files_by_folder(&self, folder_id: Option<&str>) -> Result<Vec<StoredFile>> {
        FileRepository::new(&self.pool).list_by_folder(folder_id).await
    }

    /// Delete a file. Deleting an unknown ID is a no-op.
    pub async fn delete_file(&self, id: &str) -> Result<()> {
        let deleted = FileRepository::new(&self.pool).delete(id).await?;
        if !deleted {
            debug!(file_id = %id, "delete of unknown file ignored");
        }
        Ok(())
    }

    /// Move files to a folder (None = root), skipping unknown IDs.
    pub async fn move_files(&self, ids: &[String], folder_id: Option<&str>) -> Result<u64> {
        FileRepository::new(&self.pool)
            .move_to_folder(ids, folder_id)
            .await
    }

    /// Count all files.
    pub async fn count_files(&self) -> Result<u64> {
        FileRepository::new(&self.pool).count().await
    }

    /// Count the files filed under a folder.
    pub async fn count_files_in_folder(&self, folder_id: &str) -> Result<u64> {
        FileRepository::new(&self.pool).count_by_folder(folder_id).await
    }

    /// Total stored payload size in bytes.
    pub async fn total_size(&self) -> Result<u64> {
        FileRepository::new(&self.pool).total_size().await
    }

    // Folders

    /// Create a folder, returning its generated ID.
    pub async fn put_folder(&self, name: &str) -> Result<String> {
        FolderRepository::new(&self.pool).create(name).await
    }

    /// Get a single folder.
    pub async fn get_folder(&self, id: &str) -> Result<Option<StoredFolder>> {
        FolderRepository::new(&self.pool).get_by_id(id).await
    }

    /// List every folder.
    pub async fn list_folders(&self) -> Result<Vec<StoredFolder>> {
        FolderRepository::new(&self.pool).list().await
    }

    /// Delete a folder record only. Member files keep their reference.
    pub async fn delete_folder(&self, id: &str) -> Result<()> {
        FolderRepository::new(&self.pool).delete(id).await?;
        Ok(())
    }

    /// Rename a folder, failing with `NotFound` for an unknown ID.
    pub async fn rename_folder(&self, id: &str, new_name: &str) -> Result<StoredFolder> {
        FolderRepository::new(&self.pool).rename(id, new_name).await
    }
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let store = BlobStore::open_in_memory().await.unwrap();
        assert_eq!(store.schema_version().await.unwrap(), SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_collections_and_index_exist() {
        let store = BlobStore::open_in_memory().await.unwrap();

        assert!(store.table_exists("files").await.unwrap());
        assert!(store.table_exists("folders").await.unwrap());
        assert!(store.table_exists("schema_version").await.unwrap());
        assert!(store.index_exists("idx_files_folder_id").await.unwrap());
        assert!(!store.table_exists("nonexistent").await.unwrap());
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let store = BlobStore::open_in_memory().await.unwrap();
        store.migrate().await.unwrap();
        store.migrate().await.unwrap();
        assert_eq!(store.schema_version().await.unwrap(), SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_put_then_list_contains_exactly_one_match() {
        let store = BlobStore::open_in_memory().await.unwrap();
        let blob = FileBlob::new("song.wav", "audio/wav", vec![7; 64]);

        let id = store.put_file(&blob, Some("music")).await.unwrap();

        let files = store.list_files().await.unwrap();
        let matching: Vec<_> = files.iter().filter(|f| f.blob == blob).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, id);
        assert_eq!(matching[0].folder_id.as_deref(), Some("music"));
    }

    #[tokio::test]
    async fn test_delete_unknown_file_is_noop() {
        let store = BlobStore::open_in_memory().await.unwrap();
        store.delete_file("does-not-exist").await.unwrap();
        assert_eq!(store.count_files().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rename_unknown_folder() {
        let store = BlobStore::open_in_memory().await.unwrap();
        let result = store.rename_folder("does-not-exist", "x").await;
        assert!(matches!(result, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_move_files_is_idempotent() {
        let store = BlobStore::open_in_memory().await.unwrap();
        let folder = store.put_folder("Dest").await.unwrap();
        let a = store
            .put_file(&FileBlob::new("a", "", vec![1]), None)
            .await
            .unwrap();
        let b = store
            .put_file(&FileBlob::new("b", "", vec![2]), None)
            .await
            .unwrap();
        let ids = vec![a.clone(), b.clone()];

        store.move_files(&ids, Some(&folder)).await.unwrap();
        let first = store.list_files_by_folder(Some(&folder)).await.unwrap();
        store.move_files(&ids, Some(&folder)).await.unwrap();
        let second = store.list_files_by_folder(Some(&folder)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
    }
}
