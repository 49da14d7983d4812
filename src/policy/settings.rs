//! Server-wide limit defaults.
//!
//! A single admin-editable row holds the per-role defaults. Every numeric
//! column is nullable; a missing value resolves to an unbounded limit rather
//! than denying every request.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::db::{DbPool, Role};
use crate::resource::ResourceKind;
use crate::{Database, Result, StowageError};

/// Process-wide defaults, as configured by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    /// Per-file size cap (MB).
    pub max_upload_mb: Option<i64>,
    /// Files accepted in a single upload request.
    pub max_files_per_upload: Option<i64>,
    /// Storage cap for users (MB).
    pub user_max_storage_mb: Option<i64>,
    /// Storage cap for admins (MB).
    pub admin_max_storage_mb: Option<i64>,
    /// Daily upload quota for users (MB).
    pub user_daily_quota_mb: Option<i64>,
    /// Daily upload quota for admins (MB).
    pub admin_daily_quota_mb: Option<i64>,
    /// File count limit for users.
    pub files_limit_user: Option<i64>,
    /// File count limit for admins.
    pub files_limit_admin: Option<i64>,
    /// Short link count limit for users.
    pub short_links_limit_user: Option<i64>,
    /// Short link count limit for admins.
    pub short_links_limit_admin: Option<i64>,
    /// Whether remote (URL) uploads are allowed by default.
    pub allow_remote_upload: Option<bool>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_upload_mb: Some(1024),
            max_files_per_upload: Some(25),
            user_max_storage_mb: Some(5120),
            admin_max_storage_mb: Some(10240),
            user_daily_quota_mb: Some(1024),
            admin_daily_quota_mb: Some(2048),
            files_limit_user: Some(250),
            files_limit_admin: Some(500),
            short_links_limit_user: Some(50),
            short_links_limit_admin: Some(100),
            allow_remote_upload: Some(false),
        }
    }
}

impl ServerSettings {
    /// Settings with every value unset.
    pub fn empty() -> Self {
        Self {
            max_upload_mb: None,
            max_files_per_upload: None,
            user_max_storage_mb: None,
            admin_max_storage_mb: None,
            user_daily_quota_mb: None,
            admin_daily_quota_mb: None,
            files_limit_user: None,
            files_limit_admin: None,
            short_links_limit_user: None,
            short_links_limit_admin: None,
            allow_remote_upload: None,
        }
    }

    /// Role default count limit for a resource kind.
    ///
    /// Any role other than admin reads the user column.
    pub fn count_limit(&self, kind: ResourceKind, role: Role) -> Option<i64> {
        match (kind, role) {
            (ResourceKind::Files, Role::Admin) => self.files_limit_admin,
            (ResourceKind::Files, Role::User | Role::Owner) => self.files_limit_user,
            (ResourceKind::ShortLink, Role::Admin) => self.short_links_limit_admin,
            (ResourceKind::ShortLink, Role::User | Role::Owner) => self.short_links_limit_user,
        }
    }

    /// Role default storage cap (MB).
    pub fn max_storage_mb(&self, role: Role) -> Option<i64> {
        match role {
            Role::Admin => self.admin_max_storage_mb,
            Role::User | Role::Owner => self.user_max_storage_mb,
        }
    }

    /// Role default daily quota (MB).
    pub fn daily_quota_mb(&self, role: Role) -> Option<i64> {
        match role {
            Role::Admin => self.admin_daily_quota_mb,
            Role::User | Role::Owner => self.user_daily_quota_mb,
        }
    }
}

/// Source of server settings for the policy engine.
///
/// Each policy decision asks for a fresh value; caching, if any, is up to
/// the implementation.
pub trait SettingsProvider: Send + Sync {
    /// Load the current settings.
    fn server_settings(&self) -> BoxFuture<'_, Result<ServerSettings>>;
}

/// Fixed settings, useful for tests and single-tenant setups.
impl SettingsProvider for ServerSettings {
    fn server_settings(&self) -> BoxFuture<'_, Result<ServerSettings>> {
        Box::pin(async move { Ok(self.clone()) })
    }
}

/// Settings read from the `server_settings` table on every call.
#[derive(Clone)]
pub struct DatabaseSettings {
    db: Database,
}

impl DatabaseSettings {
    /// Create a provider over the given database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl SettingsProvider for DatabaseSettings {
    fn server_settings(&self) -> BoxFuture<'_, Result<ServerSettings>> {
        Box::pin(async move { SettingsRepository::new(self.db.pool()).get().await })
    }
}

/// Repository for the settings row.
pub struct SettingsRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new SettingsRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Load the settings, or the defaults if none were saved.
    pub async fn get(&self) -> Result<ServerSettings> {
        let settings = sqlx::query_as::<_, ServerSettings>(
            "SELECT max_upload_mb, max_files_per_upload,
                    user_max_storage_mb, admin_max_storage_mb,
                    user_daily_quota_mb, admin_daily_quota_mb,
                    files_limit_user, files_limit_admin,
                    short_links_limit_user, short_links_limit_admin,
                    allow_remote_upload
             FROM server_settings WHERE id = 1",
        )
        .fetch_optional(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(settings.unwrap_or_default())
    }

    /// Replace the stored settings.
    pub async fn save(&self, settings: &ServerSettings) -> Result<()> {
        sqlx::query(
            "INSERT INTO server_settings (
                 id, max_upload_mb, max_files_per_upload,
                 user_max_storage_mb, admin_max_storage_mb,
                 user_daily_quota_mb, admin_daily_quota_mb,
                 files_limit_user, files_limit_admin,
                 short_links_limit_user, short_links_limit_admin,
                 allow_remote_upload, updated_at)
             VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, datetime('now'))
             ON CONFLICT(id) DO UPDATE SET
                 max_upload_mb = excluded.max_upload_mb,
                 max_files_per_upload = excluded.max_files_per_upload,
                 user_max_storage_mb = excluded.user_max_storage_mb,
                 admin_max_storage_mb = excluded.admin_max_storage_mb,
                 user_daily_quota_mb = excluded.user_daily_quota_mb,
                 admin_daily_quota_mb = excluded.admin_daily_quota_mb,
                 files_limit_user = excluded.files_limit_user,
                 files_limit_admin = excluded.files_limit_admin,
                 short_links_limit_user = excluded.short_links_limit_user,
                 short_links_limit_admin = excluded.short_links_limit_admin,
                 allow_remote_upload = excluded.allow_remote_upload,
                 updated_at = excluded.updated_at",
        )
        .bind(settings.max_upload_mb)
        .bind(settings.max_files_per_upload)
        .bind(settings.user_max_storage_mb)
        .bind(settings.admin_max_storage_mb)
        .bind(settings.user_daily_quota_mb)
        .bind(settings.admin_daily_quota_mb)
        .bind(settings.files_limit_user)
        .bind(settings.files_limit_admin)
        .bind(settings.short_links_limit_user)
        .bind(settings.short_links_limit_admin)
        .bind(settings.allow_remote_upload)
        .execute(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_limit_mapping() {
        let settings = ServerSettings::default();

        assert_eq!(settings.count_limit(ResourceKind::Files, Role::User), Some(250));
        assert_eq!(settings.count_limit(ResourceKind::Files, Role::Admin), Some(500));
        assert_eq!(
            settings.count_limit(ResourceKind::ShortLink, Role::User),
            Some(50)
        );
        assert_eq!(
            settings.count_limit(ResourceKind::ShortLink, Role::Admin),
            Some(100)
        );
    }

    #[test]
    fn test_role_volume_defaults() {
        let settings = ServerSettings::default();
        assert_eq!(settings.max_storage_mb(Role::User), Some(5120));
        assert_eq!(settings.max_storage_mb(Role::Admin), Some(10240));
        assert_eq!(settings.daily_quota_mb(Role::User), Some(1024));
        assert_eq!(settings.daily_quota_mb(Role::Admin), Some(2048));
    }

    #[tokio::test]
    async fn test_get_defaults_without_row() {
        let db = Database::open_in_memory().await.unwrap();
        let settings = SettingsRepository::new(db.pool()).get().await.unwrap();
        assert_eq!(settings, ServerSettings::default());
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SettingsRepository::new(db.pool());

        let mut settings = ServerSettings::default();
        settings.max_upload_mb = Some(500);
        settings.files_limit_user = None;
        settings.allow_remote_upload = Some(true);
        repo.save(&settings).await.unwrap();

        assert_eq!(repo.get().await.unwrap(), settings);

        settings.max_files_per_upload = Some(5);
        repo.save(&settings).await.unwrap();
        assert_eq!(repo.get().await.unwrap().max_files_per_upload, Some(5));
    }

    #[tokio::test]
    async fn test_providers() {
        let fixed = ServerSettings::empty();
        assert_eq!(fixed.server_settings().await.unwrap(), ServerSettings::empty());

        let db = Database::open_in_memory().await.unwrap();
        let provider = DatabaseSettings::new(db.clone());
        assert_eq!(
            provider.server_settings().await.unwrap(),
            ServerSettings::default()
        );

        SettingsRepository::new(db.pool())
            .save(&ServerSettings::empty())
            .await
            .unwrap();
        assert_eq!(
            provider.server_settings().await.unwrap(),
            ServerSettings::empty()
        );
    }
}
