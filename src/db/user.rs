//! User model for Stowage.
//!
//! This module defines the User struct and Role enum.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// User role, as supplied by the authentication layer.
///
/// Only `Owner` carries special meaning for the policy engine: it is exempt
/// from every limit. `Admin` and `User` select different server defaults;
/// no further ordering between roles is implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instance owner, never limited.
    Owner,
    /// Administrator.
    Admin,
    /// Regular user.
    #[default]
    User,
}

impl Role {
    /// Convert role to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Whether this role bypasses all limits.
    pub fn is_exempt(&self) -> bool {
        matches!(self, Role::Owner)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique, case-insensitive).
    pub username: String,
    /// Contact address for notifications (optional).
    pub email: Option<String>,
    /// Stored role.
    pub role: Role,
    /// Account creation timestamp.
    pub created_at: String,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// User role (defaults to User).
    pub role: Role,
}

impl NewUser {
    /// Create a new user with minimal required fields.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            role: Role::User,
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("owner").unwrap(), Role::Owner);
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("user").unwrap(), Role::User);
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
        assert!(Role::from_str("sysop").is_err());
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Owner.as_str(), "owner");
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(format!("{}", Role::Admin), "admin");
    }

    #[test]
    fn test_role_default() {
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_only_owner_is_exempt() {
        assert!(Role::Owner.is_exempt());
        assert!(!Role::Admin.is_exempt());
        assert!(!Role::User.is_exempt());
    }

    #[test]
    fn test_new_user_builder() {
        let user = NewUser::new("alice")
            .with_email("alice@example.com")
            .with_role(Role::Admin);

        assert_eq!(user.username, "alice");
        assert_eq!(user.email, Some("alice@example.com".to_string()));
        assert_eq!(user.role, Role::Admin);
    }
}
