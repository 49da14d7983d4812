//! Uploaded file records.

use chrono::{DateTime, Utc};

use crate::datetime;
use crate::db::DbPool;
use crate::{Result, StowageError};

/// Metadata for an uploaded file.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file ID.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Original filename (display name).
    pub original_name: String,
    /// Name of the stored blob.
    pub stored_name: String,
    /// MIME type.
    pub mime_type: String,
    /// File size in bytes.
    pub size: i64,
    /// Creation timestamp (UTC, storage format).
    pub created_at: String,
}

/// Data for creating a new file record.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    /// Owning user.
    pub user_id: i64,
    /// Original filename (display name).
    pub original_name: String,
    /// Name of the stored blob.
    pub stored_name: String,
    /// MIME type.
    pub mime_type: String,
    /// File size in bytes.
    pub size: i64,
    /// Explicit creation time; the insert time when unset.
    pub created_at: Option<DateTime<Utc>>,
}

impl NewFileRecord {
    /// Create a new NewFileRecord.
    pub fn new(
        user_id: i64,
        original_name: impl Into<String>,
        stored_name: impl Into<String>,
        size: i64,
    ) -> Self {
        Self {
            user_id,
            original_name: original_name.into(),
            stored_name: stored_name.into(),
            mime_type: "application/octet-stream".to_string(),
            size,
            created_at: None,
        }
    }

    /// Set the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Set the creation time (imports, backfills).
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }
}

/// Repository for file records.
pub struct FileRecordRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FileRecordRepository<'a> {
    /// Create a new FileRecordRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new file record.
    pub async fn create(&self, file: &NewFileRecord) -> Result<FileRecord> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO files (user_id, original_name, stored_name, mime_type, size, created_at)
             VALUES (?, ?, ?, ?, ?, COALESCE(?, datetime('now'))) RETURNING id",
        )
        .bind(file.user_id)
        .bind(&file.original_name)
        .bind(&file.stored_name)
        .bind(&file.mime_type)
        .bind(file.size)
        .bind(file.created_at.as_ref().map(datetime::to_db))
        .fetch_one(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| StowageError::NotFound("file".to_string()))
    }

    /// Get a file by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(
            "SELECT id, user_id, original_name, stored_name, mime_type, size, created_at
             FROM files WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(file)
    }

    /// List a user's files, newest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(
            "SELECT id, user_id, original_name, stored_name, mime_type, size, created_at
             FROM files WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(files)
    }

    /// Delete a file record.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
