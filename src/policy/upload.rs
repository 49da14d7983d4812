//! Upload admission checks.

use super::limit::Limit;
use super::resolver::EffectiveUploadLimits;
use crate::error::{LimitPolicyError, BYTES_PER_MB};

/// Convert a size in MB to whole bytes, rounding up.
///
/// Products within floating-point noise of a whole byte snap to it, so
/// `0.1 * 10` megabytes is exactly one megabyte.
pub fn mb_to_bytes(size_mb: f64) -> Result<u64, LimitPolicyError> {
    if !size_mb.is_finite() || size_mb < 0.0 {
        return Err(LimitPolicyError::InvalidSize(size_mb.to_string()));
    }
    let bytes = size_mb * BYTES_PER_MB as f64;
    let nearest = bytes.round();
    if (bytes - nearest).abs() <= nearest * f64::EPSILON * 16.0 + 1e-6 {
        Ok(nearest as u64)
    } else {
        Ok(bytes.ceil() as u64)
    }
}

/// Apply the upload checks in order; the first violation wins.
///
/// 1. number of files in the request
/// 2. each file against the per-file cap, in input order
/// 3. today's volume plus the request against the daily quota
/// 4. stored volume plus the request against the storage cap
///
/// Sizes are summed in MB and the total converted once. Reaching a limit
/// exactly is allowed.
pub fn check_upload(
    limits: &EffectiveUploadLimits,
    sizes_mb: &[f64],
) -> Result<(), LimitPolicyError> {
    if let Some(max) = limits
        .max_files_per_upload
        .exceeded_by(0, sizes_mb.len() as u64)
    {
        return Err(LimitPolicyError::TooManyFiles { max });
    }

    let per_file = limits.max_upload_mb.scaled(BYTES_PER_MB);
    let mut total_mb = 0.0_f64;
    for size_mb in sizes_mb {
        let size = mb_to_bytes(*size_mb)?;
        if per_file.exceeded_by(0, size).is_some() {
            return Err(LimitPolicyError::FileTooLarge {
                max_mb: limits.max_upload_mb.value().unwrap_or_default(),
            });
        }
        total_mb += size_mb;
    }
    let incoming = if total_mb.is_finite() {
        mb_to_bytes(total_mb)?
    } else {
        u64::MAX
    };

    if let Some(limit_mb) = exceeded_mb(limits.daily_quota_mb, limits.used_today_bytes, incoming) {
        return Err(LimitPolicyError::DailyQuotaExceeded {
            limit_mb,
            used_bytes: limits.used_today_bytes,
        });
    }

    if let Some(limit_mb) = exceeded_mb(limits.max_storage_mb, limits.used_storage_bytes, incoming)
    {
        return Err(LimitPolicyError::StorageExceeded {
            limit_mb,
            used_bytes: limits.used_storage_bytes,
        });
    }

    Ok(())
}

/// The MB limit, if `used + incoming` bytes go past it.
fn exceeded_mb(limit_mb: Limit, used: u64, incoming: u64) -> Option<u64> {
    limit_mb
        .scaled(BYTES_PER_MB)
        .exceeded_by(used, incoming)
        .and(limit_mb.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LimitDimension;

    fn limits() -> EffectiveUploadLimits {
        EffectiveUploadLimits {
            max_upload_mb: Limit::Max(500),
            max_files_per_upload: Limit::Max(5),
            max_storage_mb: Limit::Max(5120),
            daily_quota_mb: Limit::Max(1024),
            used_storage_bytes: 100 * BYTES_PER_MB,
            used_today_bytes: 0,
            allow_remote_upload: false,
        }
    }

    fn dimension(result: Result<(), LimitPolicyError>) -> LimitDimension {
        result.unwrap_err().dimension()
    }

    #[test]
    fn test_mb_to_bytes() {
        assert_eq!(mb_to_bytes(0.0).unwrap(), 0);
        assert_eq!(mb_to_bytes(1.0).unwrap(), BYTES_PER_MB);
        assert_eq!(mb_to_bytes(0.5).unwrap(), BYTES_PER_MB / 2);
        assert!(mb_to_bytes(-1.0).is_err());
        assert!(mb_to_bytes(f64::NAN).is_err());
        assert!(mb_to_bytes(f64::INFINITY).is_err());
    }

    #[test]
    fn test_empty_request_passes() {
        let mut tight = limits();
        tight.max_files_per_upload = Limit::Max(0);
        tight.daily_quota_mb = Limit::Max(0);
        assert!(check_upload(&tight, &[]).is_ok());
    }

    #[test]
    fn test_file_count_boundary() {
        assert!(check_upload(&limits(), &[1.0; 5]).is_ok());
        assert_eq!(
            check_upload(&limits(), &[1.0; 6]),
            Err(LimitPolicyError::TooManyFiles { max: 5 })
        );
    }

    #[test]
    fn test_per_file_boundary() {
        assert!(check_upload(&limits(), &[500.0]).is_ok());
        assert_eq!(
            check_upload(&limits(), &[500.5]),
            Err(LimitPolicyError::FileTooLarge { max_mb: 500 })
        );
    }

    #[test]
    fn test_daily_boundary() {
        let mut at = limits();
        at.used_today_bytes = 1000 * BYTES_PER_MB;
        assert!(check_upload(&at, &[24.0]).is_ok());
        assert_eq!(dimension(check_upload(&at, &[25.0])), LimitDimension::DailyQuota);
    }

    #[test]
    fn test_storage_boundary() {
        let mut at = limits();
        at.daily_quota_mb = Limit::Unlimited;
        at.used_storage_bytes = 5000 * BYTES_PER_MB;
        assert!(check_upload(&at, &[120.0]).is_ok());
        assert_eq!(
            check_upload(&at, &[121.0]),
            Err(LimitPolicyError::StorageExceeded {
                limit_mb: 5120,
                used_bytes: 5000 * BYTES_PER_MB,
            })
        );
    }

    #[test]
    fn test_count_checked_before_size() {
        let result = check_upload(&limits(), &[600.0; 6]);
        assert_eq!(dimension(result), LimitDimension::FilesPerUpload);
    }

    #[test]
    fn test_size_checked_before_daily() {
        let mut at = limits();
        at.used_today_bytes = 1024 * BYTES_PER_MB;
        let result = check_upload(&at, &[600.0]);
        assert_eq!(dimension(result), LimitDimension::FileSize);
    }

    #[test]
    fn test_daily_checked_before_storage() {
        let mut at = limits();
        at.used_today_bytes = 1000 * BYTES_PER_MB;
        at.used_storage_bytes = 5120 * BYTES_PER_MB;
        assert_eq!(dimension(check_upload(&at, &[30.0, 20.0])), LimitDimension::DailyQuota);
    }

    #[test]
    fn test_scan_stops_at_first_oversized_file() {
        let result = check_upload(&limits(), &[10.0, 600.0, f64::NAN]);
        assert_eq!(result, Err(LimitPolicyError::FileTooLarge { max_mb: 500 }));
    }

    #[test]
    fn test_invalid_size_rejected() {
        let result = check_upload(&limits(), &[10.0, -3.0]);
        assert!(matches!(result, Err(LimitPolicyError::InvalidSize(_))));
    }

    #[test]
    fn test_unlimited_admits_everything() {
        let open = EffectiveUploadLimits {
            max_upload_mb: Limit::Unlimited,
            max_files_per_upload: Limit::Unlimited,
            max_storage_mb: Limit::Unlimited,
            daily_quota_mb: Limit::Unlimited,
            used_storage_bytes: u64::MAX,
            used_today_bytes: u64::MAX,
            allow_remote_upload: true,
        };
        assert!(check_upload(&open, &[1e9; 100]).is_ok());
    }

    #[test]
    fn test_zero_limit_denies_any_bytes() {
        let mut zero = limits();
        zero.max_storage_mb = Limit::Max(0);
        zero.used_storage_bytes = 0;
        assert!(check_upload(&zero, &[0.0]).is_ok());
        assert_eq!(dimension(check_upload(&zero, &[0.001])), LimitDimension::Storage);
    }

    fn one_mb_per_day() -> EffectiveUploadLimits {
        EffectiveUploadLimits {
            max_files_per_upload: Limit::Max(10),
            daily_quota_mb: Limit::Max(1),
            used_storage_bytes: 0,
            ..limits()
        }
    }

    #[test]
    fn test_fractional_sizes_reach_daily_quota_exactly() {
        let at = one_mb_per_day();
        assert!(check_upload(&at, &[0.2; 5]).is_ok());
        assert!(check_upload(&at, &[0.1; 10]).is_ok());
        assert!(check_upload(&at, &[0.3, 0.3, 0.4]).is_ok());
        assert_eq!(
            dimension(check_upload(&at, &[0.2, 0.2, 0.2, 0.2, 0.2001])),
            LimitDimension::DailyQuota
        );
    }

    #[test]
    fn test_fractional_sizes_reach_storage_exactly() {
        let mut at = one_mb_per_day();
        at.daily_quota_mb = Limit::Unlimited;
        at.max_storage_mb = Limit::Max(1);
        assert!(check_upload(&at, &[0.1; 10]).is_ok());
        assert_eq!(dimension(check_upload(&at, &[0.5, 0.51])), LimitDimension::Storage);
    }

    #[test]
    fn test_mb_to_bytes_absorbs_float_noise() {
        let summed: f64 = [0.1; 10].iter().sum();
        assert_eq!(mb_to_bytes(summed).unwrap(), BYTES_PER_MB);
        assert_eq!(mb_to_bytes(1.0000000000000002).unwrap(), BYTES_PER_MB);
        assert_eq!(mb_to_bytes(1.0 + 1.0 / BYTES_PER_MB as f64).unwrap(), BYTES_PER_MB + 1);
        assert_eq!(mb_to_bytes(0.3 / BYTES_PER_MB as f64).unwrap(), 1);
    }
}
