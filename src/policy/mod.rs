//! Quota and usage policy.
//!
//! Decides, for each resource creation or upload, whether a user may
//! proceed. Limits come from three tiers: the owner role (never limited), a
//! per-user override, and the role default in the server settings.

mod engine;
mod limit;
mod resolver;
mod settings;
mod snapshot;
mod summary;
mod upload;
mod usage;

pub use engine::{CreateRequest, PolicyEngine, PolicyOptions, UploadRequest};
pub use limit::Limit;
pub use resolver::{resolve_count_limit, resolve_upload_limits, EffectiveUploadLimits, VolumeUsage};
pub use settings::{DatabaseSettings, ServerSettings, SettingsProvider, SettingsRepository};
pub use snapshot::{UserLimitRepository, UserLimitSnapshot};
pub use summary::{Features, PerUploadLimits, RemainingSummary, ResourceUsage, VolumeAllowance};
pub use upload::{check_upload, mb_to_bytes};
pub use usage::UsageAggregator;
