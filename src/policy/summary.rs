//! Remaining-allowance report.

use std::collections::BTreeMap;

use serde::Serialize;

use super::limit::Limit;
use super::resolver::{bytes_to_mb, serialize_limit_mb, serialize_mb, EffectiveUploadLimits};
use crate::error::BYTES_PER_MB;
use crate::resource::ResourceKind;

/// Usage of one count-limited resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceUsage {
    pub used: u64,
    pub limit: Limit,
    pub remaining: Limit,
}

impl ResourceUsage {
    pub fn new(used: u64, limit: Limit) -> Self {
        Self {
            used,
            limit,
            remaining: limit.remaining(used),
        }
    }
}

/// Usage of a volume dimension (storage, daily quota).
///
/// Byte figures are kept exact and serialized in MB, next to the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeAllowance {
    pub limit_mb: Limit,
    #[serde(rename = "usedMb", serialize_with = "serialize_mb")]
    pub used_bytes: u64,
    /// Bytes left before the limit, `null` when unlimited.
    #[serde(rename = "remainingMb", serialize_with = "serialize_limit_mb")]
    pub remaining_bytes: Limit,
}

impl VolumeAllowance {
    pub fn new(limit_mb: Limit, used_bytes: u64) -> Self {
        Self {
            limit_mb,
            used_bytes,
            remaining_bytes: limit_mb.scaled(BYTES_PER_MB).remaining(used_bytes),
        }
    }

    pub fn used_mb(&self) -> f64 {
        bytes_to_mb(self.used_bytes)
    }

    pub fn remaining_mb(&self) -> Option<f64> {
        self.remaining_bytes.value().map(bytes_to_mb)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerUploadLimits {
    pub max_upload_mb: Limit,
    pub max_files_per_upload: Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    pub remote_upload: bool,
}

/// Everything a user may still do, per resource and per dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainingSummary {
    pub resources: BTreeMap<ResourceKind, ResourceUsage>,
    pub storage: VolumeAllowance,
    pub daily_quota: VolumeAllowance,
    pub per_upload: PerUploadLimits,
    pub features: Features,
}

impl RemainingSummary {
    /// Assemble the report from resolved values.
    pub fn new(
        resources: BTreeMap<ResourceKind, ResourceUsage>,
        upload: &EffectiveUploadLimits,
    ) -> Self {
        Self {
            resources,
            storage: VolumeAllowance::new(upload.max_storage_mb, upload.used_storage_bytes),
            daily_quota: VolumeAllowance::new(upload.daily_quota_mb, upload.used_today_bytes),
            per_upload: PerUploadLimits {
                max_upload_mb: upload.max_upload_mb,
                max_files_per_upload: upload.max_files_per_upload,
            },
            features: Features {
                remote_upload: upload.allow_remote_upload,
            },
        }
    }

    pub fn resource(&self, kind: ResourceKind) -> Option<&ResourceUsage> {
        self.resources.get(&kind)
    }
}
