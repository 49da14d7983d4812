//! Per-user limit overrides.

use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::resource::ResourceKind;
use crate::{Result, StowageError};

/// Per-user overrides of the server defaults.
///
/// `None` defers to the server default; `Some(0)` is an explicit zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserLimitSnapshot {
    pub files_limit: Option<i64>,
    pub short_links_limit: Option<i64>,
    pub max_storage_mb: Option<i64>,
    pub max_upload_mb: Option<i64>,
    pub allow_remote_upload: Option<bool>,
}

impl UserLimitSnapshot {
    /// Override for the count limit of a resource kind.
    pub fn count_override(&self, kind: ResourceKind) -> Option<i64> {
        match kind {
            ResourceKind::Files => self.files_limit,
            ResourceKind::ShortLink => self.short_links_limit,
        }
    }

    pub fn with_files_limit(mut self, limit: i64) -> Self {
        self.files_limit = Some(limit);
        self
    }

    pub fn with_short_links_limit(mut self, limit: i64) -> Self {
        self.short_links_limit = Some(limit);
        self
    }

    pub fn with_max_storage_mb(mut self, mb: i64) -> Self {
        self.max_storage_mb = Some(mb);
        self
    }

    pub fn with_max_upload_mb(mut self, mb: i64) -> Self {
        self.max_upload_mb = Some(mb);
        self
    }

    pub fn with_remote_upload(mut self, allow: bool) -> Self {
        self.allow_remote_upload = Some(allow);
        self
    }
}

/// Repository for per-user overrides.
pub struct UserLimitRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserLimitRepository<'a> {
    /// Create a new UserLimitRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Overrides for a user, or `None` if none were ever set.
    pub async fn get(&self, user_id: i64) -> Result<Option<UserLimitSnapshot>> {
        let snapshot = sqlx::query_as::<_, UserLimitSnapshot>(
            "SELECT files_limit, short_links_limit, max_storage_mb, max_upload_mb,
                    allow_remote_upload
             FROM user_limits WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(snapshot)
    }

    /// Replace a user's overrides.
    pub async fn set(&self, user_id: i64, snapshot: &UserLimitSnapshot) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_limits (
                 user_id, files_limit, short_links_limit, max_storage_mb, max_upload_mb,
                 allow_remote_upload, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, datetime('now'))
             ON CONFLICT(user_id) DO UPDATE SET
                 files_limit = excluded.files_limit,
                 short_links_limit = excluded.short_links_limit,
                 max_storage_mb = excluded.max_storage_mb,
                 max_upload_mb = excluded.max_upload_mb,
                 allow_remote_upload = excluded.allow_remote_upload,
                 updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(snapshot.files_limit)
        .bind(snapshot.short_links_limit)
        .bind(snapshot.max_storage_mb)
        .bind(snapshot.max_upload_mb)
        .bind(snapshot.allow_remote_upload)
        .execute(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(())
    }

    /// Remove all overrides for a user.
    pub async fn clear(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_limits WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool)
            .await
            .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    #[test]
    fn test_count_override() {
        let snapshot = UserLimitSnapshot::default().with_files_limit(0);
        assert_eq!(snapshot.count_override(ResourceKind::Files), Some(0));
        assert_eq!(snapshot.count_override(ResourceKind::ShortLink), None);
    }

    #[tokio::test]
    async fn test_set_get_clear() {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("limited"))
            .await
            .unwrap();
        let repo = UserLimitRepository::new(db.pool());

        assert!(repo.get(user.id).await.unwrap().is_none());

        let snapshot = UserLimitSnapshot::default()
            .with_files_limit(0)
            .with_max_storage_mb(100)
            .with_remote_upload(true);
        repo.set(user.id, &snapshot).await.unwrap();
        assert_eq!(repo.get(user.id).await.unwrap(), Some(snapshot));

        let replaced = UserLimitSnapshot::default().with_short_links_limit(3);
        repo.set(user.id, &replaced).await.unwrap();
        let stored = repo.get(user.id).await.unwrap().unwrap();
        assert_eq!(stored.files_limit, None);
        assert_eq!(stored.short_links_limit, Some(3));

        assert!(repo.clear(user.id).await.unwrap());
        assert!(repo.get(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overrides_removed_with_user() {
        let db = Database::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool());
        let user = users.create(&NewUser::new("gone")).await.unwrap();
        let repo = UserLimitRepository::new(db.pool());

        repo.set(user.id, &UserLimitSnapshot::default().with_files_limit(1))
            .await
            .unwrap();
        users.delete(user.id).await.unwrap();

        assert!(repo.get(user.id).await.unwrap().is_none());
    }
}
