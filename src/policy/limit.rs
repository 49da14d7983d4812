//! Effective limit values.

use std::fmt;

use serde::{Serialize, Serializer};

/// A resolved limit: either no bound at all, or a concrete maximum.
///
/// `Unlimited` admits any usage. It serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limit {
    /// No bound.
    Unlimited,
    /// Inclusive upper bound.
    Max(u64),
}

impl Limit {
    /// Limit from a stored setting; an absent setting is unbounded.
    pub fn from_setting(value: Option<i64>) -> Self {
        value.map_or(Limit::Unlimited, Limit::bounded)
    }

    /// Limit from a stored number. Negative numbers deny everything.
    pub fn bounded(value: i64) -> Self {
        Limit::Max(u64::try_from(value).unwrap_or(0))
    }

    /// Whether this is the unbounded limit.
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Limit::Unlimited)
    }

    /// The bound, if any.
    pub fn value(&self) -> Option<u64> {
        match self {
            Limit::Unlimited => None,
            Limit::Max(max) => Some(*max),
        }
    }

    /// Whether `used + incoming` stays within the limit. Reaching it exactly is allowed.
    pub fn admits(&self, used: u64, incoming: u64) -> bool {
        self.exceeded_by(used, incoming).is_none()
    }

    /// The bound when `used + incoming` strictly exceeds it.
    pub fn exceeded_by(&self, used: u64, incoming: u64) -> Option<u64> {
        match self {
            Limit::Max(max) if used.saturating_add(incoming) > *max => Some(*max),
            _ => None,
        }
    }

    /// Headroom left after `used`, never negative.
    pub fn remaining(&self, used: u64) -> Limit {
        match self {
            Limit::Unlimited => Limit::Unlimited,
            Limit::Max(max) => Limit::Max(max.saturating_sub(used)),
        }
    }

    /// The same limit expressed in a smaller unit (e.g. MB to bytes).
    pub fn scaled(&self, factor: u64) -> Limit {
        match self {
            Limit::Unlimited => Limit::Unlimited,
            Limit::Max(max) => Limit::Max(max.saturating_mul(factor)),
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Unlimited => write!(f, "unlimited"),
            Limit::Max(max) => write!(f, "{max}"),
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Limit::Unlimited => serializer.serialize_none(),
            Limit::Max(max) => serializer.serialize_u64(*max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_setting() {
        assert_eq!(Limit::from_setting(None), Limit::Unlimited);
        assert_eq!(Limit::from_setting(Some(0)), Limit::Max(0));
        assert_eq!(Limit::from_setting(Some(250)), Limit::Max(250));
        assert_eq!(Limit::from_setting(Some(-5)), Limit::Max(0));
    }

    #[test]
    fn test_admits_boundary() {
        let limit = Limit::Max(10);
        assert!(limit.admits(9, 1));
        assert!(!limit.admits(10, 1));
        assert!(limit.admits(0, 10));
        assert_eq!(limit.exceeded_by(5, 6), Some(10));
    }

    #[test]
    fn test_unlimited_admits_anything() {
        assert!(Limit::Unlimited.admits(u64::MAX, u64::MAX));
        assert_eq!(Limit::Unlimited.exceeded_by(u64::MAX, 1), None);
    }

    #[test]
    fn test_zero_denies_one() {
        assert!(!Limit::Max(0).admits(0, 1));
        assert!(Limit::Max(0).admits(0, 0));
    }

    #[test]
    fn test_remaining() {
        assert_eq!(Limit::Max(50).remaining(20), Limit::Max(30));
        assert_eq!(Limit::Max(50).remaining(70), Limit::Max(0));
        assert_eq!(Limit::Unlimited.remaining(70), Limit::Unlimited);
    }

    #[test]
    fn test_scaled_saturates() {
        assert_eq!(Limit::Max(2).scaled(1024), Limit::Max(2048));
        assert_eq!(Limit::Max(u64::MAX).scaled(2), Limit::Max(u64::MAX));
        assert_eq!(Limit::Unlimited.scaled(2), Limit::Unlimited);
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_string(&Limit::Unlimited).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Limit::Max(7)).unwrap(), "7");
        assert_eq!(Limit::Unlimited.to_string(), "unlimited");
    }
}
