//! Short link records.

use crate::db::DbPool;
use crate::{Result, StowageError};

/// A shortened link.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShortLink {
    /// Unique link ID.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Target URL.
    pub original_url: String,
    /// Public slug (unique).
    pub slug: String,
    /// Creation timestamp (UTC, storage format).
    pub created_at: String,
}

/// Data for creating a new short link.
#[derive(Debug, Clone)]
pub struct NewShortLink {
    /// Owning user.
    pub user_id: i64,
    /// Target URL.
    pub original_url: String,
    /// Public slug.
    pub slug: String,
}

impl NewShortLink {
    /// Create a new NewShortLink.
    pub fn new(user_id: i64, original_url: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            user_id,
            original_url: original_url.into(),
            slug: slug.into(),
        }
    }
}

/// Repository for short links.
pub struct ShortLinkRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ShortLinkRepository<'a> {
    /// Create a new ShortLinkRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new short link.
    pub async fn create(&self, link: &NewShortLink) -> Result<ShortLink> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO short_links (user_id, original_url, slug) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(link.user_id)
        .bind(&link.original_url)
        .bind(&link.slug)
        .fetch_one(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| StowageError::NotFound("short link".to_string()))
    }

    /// Get a short link by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<ShortLink>> {
        let link = sqlx::query_as::<_, ShortLink>(
            "SELECT id, user_id, original_url, slug, created_at FROM short_links WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(link)
    }

    /// Get a short link by slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<ShortLink>> {
        let link = sqlx::query_as::<_, ShortLink>(
            "SELECT id, user_id, original_url, slug, created_at FROM short_links WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(link)
    }

    /// List a user's short links, newest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<ShortLink>> {
        let links = sqlx::query_as::<_, ShortLink>(
            "SELECT id, user_id, original_url, slug, created_at
             FROM short_links WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(links)
    }

    /// Delete a short link.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM short_links WHERE id = ?")
            .bind(id)
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

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("linker"))
            .await
            .unwrap();
        let repo = ShortLinkRepository::new(db.pool());

        let link = repo
            .create(&NewShortLink::new(user.id, "https://example.com/a", "abc"))
            .await
            .unwrap();

        assert_eq!(link.slug, "abc");
        let by_slug = repo.get_by_slug("abc").await.unwrap().unwrap();
        assert_eq!(by_slug.id, link.id);
        assert_eq!(repo.list_by_user(user.id).await.unwrap().len(), 1);

        assert!(repo.delete(link.id).await.unwrap());
        assert!(repo.get_by_slug("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("linker"))
            .await
            .unwrap();
        let repo = ShortLinkRepository::new(db.pool());

        repo.create(&NewShortLink::new(user.id, "https://a", "dup"))
            .await
            .unwrap();
        let result = repo
            .create(&NewShortLink::new(user.id, "https://b", "dup"))
            .await;
        assert!(matches!(result, Err(StowageError::Database(_))));
    }
}
