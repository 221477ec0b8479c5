//! Folder types and repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::{Result, VaultError};

/// A folder in the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFolder {
    /// Unique folder ID (UUID v4).
    pub id: String,
    /// Display name.
    pub name: String,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct FolderRow {
    id: String,
    name: String,
    created_at: i64,
}

impl FolderRow {
    fn into_folder(self) -> StoredFolder {
        StoredFolder {
            id: self.id,
            name: self.name,
            created_at: DateTime::from_timestamp_millis(self.created_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Repository for folder records.
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository with the given pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new empty folder and return its generated ID.
    pub async fn create(&self, name: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().timestamp_millis();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        sqlx::query("INSERT INTO folders (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        debug!(folder_id = %id, "created folder");
        Ok(id)
    }

    /// Get a folder by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<StoredFolder>> {
        let row: Option<FolderRow> =
            sqlx::query_as("SELECT id, name, created_at FROM folders WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| VaultError::ReadFailed(e.to_string()))?;

        Ok(row.map(FolderRow::into_folder))
    }

    /// List all folders.
    pub async fn list(&self) -> Result<Vec<StoredFolder>> {
        let rows: Vec<FolderRow> =
            sqlx::query_as("SELECT id, name, created_at FROM folders ORDER BY created_at, id")
                .fetch_all(self.pool)
                .await
                .map_err(|e| VaultError::ReadFailed(e.to_string()))?;

        Ok(rows.into_iter().map(FolderRow::into_folder).collect())
    }

    /// Rename a folder.
    ///
    /// Fails with `NotFound` if the folder does not exist.
    pub async fn rename(&self, id: &str, new_name: &str) -> Result<StoredFolder> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        let existing: Option<FolderRow> =
            sqlx::query_as("SELECT id, name, created_at FROM folders WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| VaultError::ReadFailed(e.to_string()))?;

        let Some(mut row) = existing else {
            return Err(VaultError::NotFound("folder".to_string()));
        };

        sqlx::query("UPDATE folders SET name = ? WHERE id = ?")
            .bind(new_name)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        row.name = new_name.to_string();
        Ok(row.into_folder())
    }

    /// Delete a folder record. Files referencing it are left untouched.
    ///
    /// Returns `false` if no such folder existed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        let result = sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| VaultError::WriteFailed(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
