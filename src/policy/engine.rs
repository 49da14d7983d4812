//! The policy engine.
//!
//! Every decision reads settings, overrides and usage afresh, then decides
//! synchronously. Admission is a soft limit: nothing is locked between the
//! check and the caller persisting the resource, so concurrent requests for
//! the same user can jointly overshoot a limit.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::info;

use super::limit::Limit;
use super::resolver::{
    resolve_count_limit, resolve_upload_limits, EffectiveUploadLimits, VolumeUsage,
};
use super::settings::{DatabaseSettings, ServerSettings, SettingsProvider};
use super::snapshot::{UserLimitRepository, UserLimitSnapshot};
use super::summary::{RemainingSummary, ResourceUsage};
use super::upload::check_upload;
use super::usage::UsageAggregator;
use crate::config::PolicyConfig;
use crate::datetime::Zone;
use crate::db::Role;
use crate::error::LimitPolicyError;
use crate::notify::{LimitNotice, LimitNotifier, NotificationDispatcher};
use crate::resource::ResourceKind;
use crate::{Database, Result, StowageError};

/// Engine options, injected rather than read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyOptions {
    /// Zone whose calendar day bounds the daily quota.
    pub zone: Zone,
    /// Whether limit-reached notices are sent.
    pub limit_emails: bool,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        Self {
            zone: Zone::default(),
            limit_emails: true,
        }
    }
}

impl PolicyOptions {
    pub fn from_config(config: &PolicyConfig) -> Result<Self> {
        Ok(Self {
            zone: config.zone()?,
            limit_emails: config.limit_emails,
        })
    }
}

/// A request to create `incoming` resources of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateRequest {
    pub user_id: i64,
    pub kind: ResourceKind,
    pub role: Role,
    /// Items about to be created; zero counts as one.
    pub incoming: u64,
}

impl CreateRequest {
    /// One resource, created by a regular user.
    pub fn new(user_id: i64, kind: ResourceKind) -> Self {
        Self {
            user_id,
            kind,
            role: Role::User,
            incoming: 1,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_incoming(mut self, incoming: u64) -> Self {
        self.incoming = incoming;
        self
    }
}

/// A request to upload files of the given sizes (MB).
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub user_id: i64,
    pub role: Role,
    pub sizes_mb: Vec<f64>,
}

impl UploadRequest {
    pub fn new(user_id: i64, sizes_mb: impl Into<Vec<f64>>) -> Self {
        Self {
            user_id,
            role: Role::User,
            sizes_mb: sizes_mb.into(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Decides whether resource creation and uploads may proceed.
#[derive(Clone)]
pub struct PolicyEngine {
    db: Database,
    settings: Arc<dyn SettingsProvider>,
    dispatcher: NotificationDispatcher,
    zone: Zone,
}

impl PolicyEngine {
    /// Create an engine.
    pub fn new(
        db: Database,
        settings: Arc<dyn SettingsProvider>,
        notifier: Arc<dyn LimitNotifier>,
        options: PolicyOptions,
    ) -> Self {
        let dispatcher =
            NotificationDispatcher::new(db.clone(), notifier).with_enabled(options.limit_emails);
        Self {
            db,
            settings,
            dispatcher,
            zone: options.zone,
        }
    }

    /// Create an engine reading server settings from the database.
    pub fn with_database_settings(
        db: Database,
        notifier: Arc<dyn LimitNotifier>,
        options: PolicyOptions,
    ) -> Self {
        let settings = Arc::new(DatabaseSettings::new(db.clone()));
        Self::new(db, settings, notifier, options)
    }

    fn usage(&self) -> UsageAggregator<'_> {
        UsageAggregator::new(self.db.pool(), self.zone)
    }

    async fn settings_and_overrides(
        &self,
        user_id: i64,
    ) -> Result<(ServerSettings, Option<UserLimitSnapshot>)> {
        let overrides = UserLimitRepository::new(self.db.pool());
        tokio::try_join!(self.settings.server_settings(), overrides.get(user_id))
    }

    async fn volume_usage(&self, user_id: i64) -> Result<VolumeUsage> {
        let usage = self.usage();
        let (stored_bytes, today_bytes) = tokio::try_join!(
            usage.total_storage_bytes(user_id),
            usage.today_uploaded_bytes(user_id)
        )?;
        Ok(VolumeUsage {
            stored_bytes,
            today_bytes,
        })
    }

    /// Log a denial, notify the user if warranted, and convert it to an error.
    fn deny(&self, user_id: i64, err: LimitPolicyError) -> StowageError {
        info!(user_id, dimension = ?err.dimension(), "Request denied: {}", err);
        if let Some(notice) = LimitNotice::for_denial(&err) {
            self.dispatcher.dispatch(user_id, notice);
        }
        err.into()
    }

    /// Effective count limit for a resource kind.
    pub async fn effective_limit(
        &self,
        user_id: i64,
        kind: ResourceKind,
        role: Role,
    ) -> Result<Limit> {
        let (settings, overrides) = self.settings_and_overrides(user_id).await?;
        Ok(resolve_count_limit(kind, role, overrides.as_ref(), &settings))
    }

    /// Current number of resources of a kind.
    pub async fn usage_for_user(&self, user_id: i64, kind: ResourceKind) -> Result<u64> {
        self.usage().count_resources(user_id, kind).await
    }

    /// Check that creating `incoming` more resources stays within the count limit.
    pub async fn enforce_create_limit(&self, request: &CreateRequest) -> Result<()> {
        let limit = self
            .effective_limit(request.user_id, request.kind, request.role)
            .await?;
        if limit.is_unlimited() {
            return Ok(());
        }

        let used = self.usage_for_user(request.user_id, request.kind).await?;
        match limit.exceeded_by(used, request.incoming.max(1)) {
            Some(max) => Err(self.deny(
                request.user_id,
                LimitPolicyError::CountExceeded {
                    kind: request.kind,
                    used,
                    limit: max,
                },
            )),
            None => Ok(()),
        }
    }

    /// All upload limits and current volume usage.
    pub async fn effective_upload_limits(
        &self,
        user_id: i64,
        role: Role,
    ) -> Result<EffectiveUploadLimits> {
        let (settings, overrides) = self.settings_and_overrides(user_id).await?;
        let usage = self.volume_usage(user_id).await?;
        Ok(resolve_upload_limits(role, overrides.as_ref(), &settings, usage))
    }

    /// Check an upload request against every upload dimension.
    ///
    /// An empty request and any request by the owner pass without reading anything.
    pub async fn enforce_upload_policy(&self, request: &UploadRequest) -> Result<()> {
        if request.sizes_mb.is_empty() || request.role.is_exempt() {
            return Ok(());
        }

        let limits = self
            .effective_upload_limits(request.user_id, request.role)
            .await?;
        check_upload(&limits, &request.sizes_mb).map_err(|e| self.deny(request.user_id, e))
    }

    /// Check that the user may upload from a remote URL.
    pub async fn ensure_remote_upload_allowed(&self, user_id: i64, role: Role) -> Result<()> {
        if role.is_exempt() {
            return Ok(());
        }

        let (settings, overrides) = self.settings_and_overrides(user_id).await?;
        let limits =
            resolve_upload_limits(role, overrides.as_ref(), &settings, VolumeUsage::default());
        if limits.allow_remote_upload {
            Ok(())
        } else {
            Err(self.deny(user_id, LimitPolicyError::RemoteUploadDisabled))
        }
    }

    /// Usage, limits and headroom for every resource kind and upload dimension.
    pub async fn remaining_summary(&self, user_id: i64, role: Role) -> Result<RemainingSummary> {
        let (settings, overrides) = self.settings_and_overrides(user_id).await?;

        let usage = self.usage();
        let counts = try_join_all(
            ResourceKind::ALL
                .iter()
                .map(|kind| usage.count_resources(user_id, *kind)),
        )
        .await?;
        let volume = self.volume_usage(user_id).await?;

        let resources: BTreeMap<_, _> = ResourceKind::ALL
            .iter()
            .zip(counts)
            .map(|(kind, used)| {
                let limit = resolve_count_limit(*kind, role, overrides.as_ref(), &settings);
                (*kind, ResourceUsage::new(used, limit))
            })
            .collect();
        let upload = resolve_upload_limits(role, overrides.as_ref(), &settings, volume);

        Ok(RemainingSummary::new(resources, &upload))
    }
}
