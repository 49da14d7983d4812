//! Error types for Stowage.

use thiserror::Error;

use crate::resource::ResourceKind;

/// Bytes per megabyte, as used for every MB figure in the policy engine.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Common error type for Stowage.
#[derive(Error, Debug)]
pub enum StowageError {
    /// Database error.
    ///
    /// Database errors from sqlx are converted into this variant unchanged
    /// in meaning; the policy engine never retries them.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for caller input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A quota or usage policy denied the request.
    #[error(transparent)]
    LimitPolicy(#[from] LimitPolicyError),
}

impl StowageError {
    /// The policy denial carried by this error, if any.
    pub fn as_limit_policy(&self) -> Option<&LimitPolicyError> {
        match self {
            StowageError::LimitPolicy(e) => Some(e),
            _ => None,
        }
    }
}

// Conversion from sqlx errors
impl From<sqlx::Error> for StowageError {
    fn from(e: sqlx::Error) -> Self {
        StowageError::Database(e.to_string())
    }
}

/// Result type alias for Stowage operations.
pub type Result<T> = std::result::Result<T, StowageError>;

/// The dimension a policy denial was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDimension {
    /// Number of persisted resources of one kind.
    Count(ResourceKind),
    /// Number of files in a single upload request.
    FilesPerUpload,
    /// Size of a single file.
    FileSize,
    /// Volume uploaded during the current local day.
    DailyQuota,
    /// Total stored volume.
    Storage,
    /// Remote (URL) upload permission.
    RemoteUpload,
}

/// A request denied by the quota policy.
///
/// This is the only error the policy engine originates. Callers surface the
/// message to the user; it is never a transient condition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LimitPolicyError {
    /// Creating the requested resources would exceed the count limit.
    #[error("You have reached the limit for {} ({used} used, {limit} max).", .kind.plural())]
    CountExceeded {
        kind: ResourceKind,
        used: u64,
        limit: u64,
    },

    /// Too many files in one upload request.
    #[error("You can upload at most {max} files per request.")]
    TooManyFiles { max: u64 },

    /// A file is larger than the per-file cap.
    #[error("One of your files exceeds the maximum upload size ({max_mb} MB).")]
    FileTooLarge { max_mb: u64 },

    /// The upload would exceed today's quota.
    #[error(
        "Daily upload quota exceeded ({limit_mb} MB per day, {} MB used today).",
        whole_mb(.used_bytes)
    )]
    DailyQuotaExceeded { limit_mb: u64, used_bytes: u64 },

    /// The upload would exceed the total storage cap.
    #[error(
        "Storage limit exceeded ({limit_mb} MB total, {} MB used).",
        whole_mb(.used_bytes)
    )]
    StorageExceeded { limit_mb: u64, used_bytes: u64 },

    /// Remote uploads are disabled for this account.
    #[error("Remote uploads are not enabled for your account.")]
    RemoteUploadDisabled,

    /// A proposed file size is negative or not a number.
    #[error("Invalid file size: {0} MB.")]
    InvalidSize(String),
}

impl LimitPolicyError {
    /// The dimension that was violated.
    pub fn dimension(&self) -> LimitDimension {
        match self {
            LimitPolicyError::CountExceeded { kind, .. } => LimitDimension::Count(*kind),
            LimitPolicyError::TooManyFiles { .. } => LimitDimension::FilesPerUpload,
            LimitPolicyError::FileTooLarge { .. } | LimitPolicyError::InvalidSize(_) => {
                LimitDimension::FileSize
            }
            LimitPolicyError::DailyQuotaExceeded { .. } => LimitDimension::DailyQuota,
            LimitPolicyError::StorageExceeded { .. } => LimitDimension::Storage,
            LimitPolicyError::RemoteUploadDisabled => LimitDimension::RemoteUpload,
        }
    }

    /// Limit name and details for the limit-reached notification.
    ///
    /// Only count, daily quota and storage denials notify the user; per-request
    /// shape problems are reported to the caller alone.
    pub fn notice(&self) -> Option<(String, String)> {
        match self {
            LimitPolicyError::CountExceeded { kind, used, limit } => Some((
                format!("{} count", kind.as_str()),
                format!(
                    "You have {used} {}(s) out of a maximum of {limit}.",
                    kind.as_str()
                ),
            )),
            LimitPolicyError::DailyQuotaExceeded {
                limit_mb,
                used_bytes,
            } => Some((
                "Daily upload quota".to_string(),
                format!(
                    "Used {} MB of {limit_mb} MB. Incoming would exceed the daily cap.",
                    whole_mb(used_bytes)
                ),
            )),
            LimitPolicyError::StorageExceeded {
                limit_mb,
                used_bytes,
            } => Some((
                "Total storage".to_string(),
                format!(
                    "Used {} MB of {limit_mb} MB. Incoming would exceed your storage capacity.",
                    whole_mb(used_bytes)
                ),
            )),
            _ => None,
        }
    }
}

/// Round a byte count to the nearest whole megabyte.
fn whole_mb(bytes: &u64) -> u64 {
    (*bytes + BYTES_PER_MB / 2) / BYTES_PER_MB
}
