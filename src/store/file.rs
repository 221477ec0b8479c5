//! Stored file types and repository.

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::{Result, VaultError};

const FILE_COLUMNS: &str = "id, name, content_type, content, uploaded_at, folder_id";

/// An uploaded payload: bytes plus the declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    /// Original file name.
    pub name: String,
    /// Declared MIME type (may be empty).
    pub content_type: String,
    /// File content.
    pub data: Vec<u8>,
}

impl FileBlob {
    /// Create a new blob.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Read a blob from disk, guessing the content type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();

        Ok(Self {
            name,
            content_type,
            data,
        })
    }

    /// Payload size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A file record in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Unique file ID (UUID v4).
    pub id: String,
    /// Payload, immutable after creation.
    pub blob: FileBlob,
    /// When the file was stored.
    pub uploaded_at: DateTime<Utc>,
    /// Folder the file is filed under (None for root).
    pub folder_id: Option<String>,
}

impl StoredFile {
    /// Payload size in bytes.
    pub fn size(&self) -> u64 {
        self.blob.size()
    }

    /// Declared MIME type.
    pub fn content_type(&self) -> &str {
        &self.blob.content_type
    }
}

#[derive(sqlx::FromRow)]
struct FileRow {
    id: String,
    name: String,
    content_type: String,
    content: Vec<u8>,
    uploaded_at: i64,
    folder_id: Option<String>,
}

impl FileRow {
    fn into_file(self) -> StoredFile {
        StoredFile {
            id: self.id,
            blob: FileBlob {
                name: self.name,
                content_type: self.content_type,
                data: self.content,
            },
            uploaded_at: DateTime::from_timestamp_millis(self.uploaded_at)
                .unwrap_or_else(Utc::now),
            folder_id: self.folder_id,
        }
    }
}

/// Repository for file records.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new file and return its generated ID.
    pub async fn create(&self, blob: &FileBlob, folder_id: Option<&str>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let uploaded_at = Utc::now().timestamp_millis();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        sqlx::query(
            "INSERT INTO files (id, name, content_type, content, uploaded_at, folder_id)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&blob.name)
        .bind(&blob.content_type)
        .bind(&blob.data)
        .bind(uploaded_at)
        .bind(folder_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        debug!(file_id = %id, size = blob.size(), "stored file");
        Ok(id)
    }

    /// Get a file by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<StoredFile>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?");
        let row: Option<FileRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| VaultError::ReadFailed(e.to_string()))?;

        Ok(row.map(FileRow::into_file))
    }

    /// List all files.
    pub async fn list(&self) -> Result<Vec<StoredFile>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files ORDER BY uploaded_at, id");
        let rows: Vec<FileRow> = sqlx::query_as(&sql)
            .fetch_all(self.pool)
            .await
            .map_err(|e| VaultError::ReadFailed(e.to_string()))?;

        Ok(rows.into_iter().map(FileRow::into_file).collect())
    }

    /// List files filed under a folder, or the root files when `folder_id` is None.
    ///
    /// Root files are found by filtering the full listing; the folder index
    /// only serves lookups by a concrete folder ID.
    pub async fn list_by_folder(&self, folder_id: Option<&str>) -> Result<Vec<StoredFile>> {
        let Some(folder_id) = folder_id else {
            let files = self.list().await?;
            return Ok(files.into_iter().filter(|f| f.folder_id.is_none()).collect());
        };

        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE folder_id = ? ORDER BY uploaded_at, id");
        let rows: Vec<FileRow> = sqlx::query_as(&sql)
            .bind(folder_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| VaultError::ReadFailed(e.to_string()))?;

        Ok(rows.into_iter().map(FileRow::into_file).collect())
    }

    /// Delete a file by ID.
    ///
    /// Returns `false` if no such file existed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Reassign a batch of files to a folder (None moves them to root).
    ///
    /// The whole batch is one transaction. Unknown IDs are skipped.
    /// Returns the number of files updated.
    pub async fn move_to_folder(&self, ids: &[String], folder_id: Option<&str>) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        let mut moved = 0;
        for id in ids {
            let result = sqlx::query("UPDATE files SET folder_id = ? WHERE id = ?")
                .bind(folder_id)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| VaultError::WriteFailed(e.to_string()))?;
            moved += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        debug!(requested = ids.len(), moved, ?folder_id, "moved files");
        Ok(moved)
    }

    /// Count all files.
    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(self.pool)
            .await
            .map_err(|e| VaultError::ReadFailed(e.to_string()))?;

        Ok(count as u64)
    }

    /// Count files filed under a folder.
    pub async fn count_by_folder(&self, folder_id: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE folder_id = ?")
            .bind(folder_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| VaultError::ReadFailed(e.to_string()))?;

        Ok(count as u64)
    }

    /// Total payload size of all files in bytes.
    pub async fn total_size(&self) -> Result<u64> {
        let size: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(LENGTH(content)), 0) FROM files")
            .fetch_one(self.pool)
            .await
            .map_err(|e| VaultError::ReadFailed(e.to_string()))?;

        Ok(size as u64)
    }
}
