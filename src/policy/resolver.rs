//! Limit resolution.
//!
//! Precedence, highest first: the owner role (never limited), a per-user
//! override, the role default from the server settings. Resolution is pure;
//! all inputs are fetched by the caller.

use serde::{Serialize, Serializer};

use super::limit::Limit;
use super::settings::ServerSettings;
use super::snapshot::UserLimitSnapshot;
use crate::db::Role;
use crate::error::BYTES_PER_MB;
use crate::resource::ResourceKind;

/// Resolve the count limit for one resource kind.
pub fn resolve_count_limit(
    kind: ResourceKind,
    role: Role,
    snapshot: Option<&UserLimitSnapshot>,
    settings: &ServerSettings,
) -> Limit {
    if role.is_exempt() {
        return Limit::Unlimited;
    }
    match snapshot.and_then(|s| s.count_override(kind)) {
        Some(value) => Limit::bounded(value),
        None => Limit::from_setting(settings.count_limit(kind, role)),
    }
}

/// Volume already consumed by a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeUsage {
    /// Bytes stored across all files.
    pub stored_bytes: u64,
    /// Bytes uploaded during the current day.
    pub today_bytes: u64,
}

/// Upload limits and usage for one user, resolved at one instant.
///
/// Serializes every figure in MB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveUploadLimits {
    /// Per-file cap (MB).
    pub max_upload_mb: Limit,
    /// Files per request.
    pub max_files_per_upload: Limit,
    /// Total storage cap (MB).
    pub max_storage_mb: Limit,
    /// Daily upload quota (MB).
    pub daily_quota_mb: Limit,
    /// Bytes currently stored.
    #[serde(rename = "usedStorageMb", serialize_with = "serialize_mb")]
    pub used_storage_bytes: u64,
    /// Bytes uploaded today.
    #[serde(rename = "usedTodayMb", serialize_with = "serialize_mb")]
    pub used_today_bytes: u64,
    /// Whether remote (URL) uploads are allowed.
    pub allow_remote_upload: bool,
}

impl EffectiveUploadLimits {
    pub fn used_storage_mb(&self) -> f64 {
        bytes_to_mb(self.used_storage_bytes)
    }

    pub fn used_today_mb(&self) -> f64 {
        bytes_to_mb(self.used_today_bytes)
    }
}

pub(crate) fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB as f64
}

/// Serialize a byte count as fractional MB.
pub(crate) fn serialize_mb<S: Serializer>(bytes: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(bytes_to_mb(*bytes))
}

/// Serialize a byte limit as fractional MB, `null` when unlimited.
pub(crate) fn serialize_limit_mb<S: Serializer>(
    bytes: &Limit,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match bytes.value() {
        Some(bytes) => serializer.serialize_some(&bytes_to_mb(bytes)),
        None => serializer.serialize_none(),
    }
}

/// Resolve every upload dimension for a user.
///
/// The owner gets unbounded limits and remote uploads, but usage is still
/// reported.
pub fn resolve_upload_limits(
    role: Role,
    snapshot: Option<&UserLimitSnapshot>,
    settings: &ServerSettings,
    usage: VolumeUsage,
) -> EffectiveUploadLimits {
    if role.is_exempt() {
        return EffectiveUploadLimits {
            max_upload_mb: Limit::Unlimited,
            max_files_per_upload: Limit::Unlimited,
            max_storage_mb: Limit::Unlimited,
            daily_quota_mb: Limit::Unlimited,
            used_storage_bytes: usage.stored_bytes,
            used_today_bytes: usage.today_bytes,
            allow_remote_upload: true,
        };
    }

    let overrides = snapshot.cloned().unwrap_or_default();
    EffectiveUploadLimits {
        max_upload_mb: Limit::from_setting(overrides.max_upload_mb.or(settings.max_upload_mb)),
        max_files_per_upload: Limit::from_setting(settings.max_files_per_upload),
        max_storage_mb: Limit::from_setting(
            overrides
                .max_storage_mb
                .or_else(|| settings.max_storage_mb(role)),
        ),
        daily_quota_mb: Limit::from_setting(settings.daily_quota_mb(role)),
        used_storage_bytes: usage.stored_bytes,
        used_today_bytes: usage.today_bytes,
        allow_remote_upload: overrides
            .allow_remote_upload
            .or(settings.allow_remote_upload)
            .unwrap_or(false),
    }
}
