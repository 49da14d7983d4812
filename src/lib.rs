//! Stowage - quota and usage policy engine for a multi-tenant file and link host.
//!
//! Callers that already know a user's id and role ask the [`PolicyEngine`]
//! whether a resource creation or an upload may proceed, then persist the
//! resource themselves.

pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod logging;
pub mod notify;
pub mod policy;
pub mod resource;

pub use config::Config;
pub use datetime::Zone;
pub use db::{Database, NewUser, Role, User, UserRepository};
pub use error::{LimitDimension, LimitPolicyError, Result, StowageError, BYTES_PER_MB};
pub use notify::{LimitNotice, LimitNotifier, NotificationDispatcher, OutboxNotifier};
pub use policy::{
    CreateRequest, EffectiveUploadLimits, Limit, PolicyEngine, PolicyOptions, RemainingSummary,
    ServerSettings, SettingsProvider, UploadRequest, UserLimitSnapshot,
};
pub use resource::ResourceKind;
