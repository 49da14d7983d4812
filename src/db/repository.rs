//! User repository for Stowage.
//!
//! This module provides CRUD operations for users in the database.

use super::user::{NewUser, Role, User};
use super::DbPool;
use crate::{Result, StowageError};

/// Raw user row as stored.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: Option<String>,
    role: String,
    created_at: String,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            role: self.role.parse().unwrap_or_default(),
            created_at: self.created_at,
        }
    }
}

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Returns the created user with the assigned ID.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, email, role) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(new_user.role.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| StowageError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, role, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(row.map(UserRow::into_user))
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, role, created_at
             FROM users WHERE username = ? COLLATE NOCASE",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(row.map(UserRow::into_user))
    }

    /// Look up the contact address of a user.
    ///
    /// Returns `None` when the user does not exist or has no usable address.
    pub async fn email_for(&self, id: i64) -> Result<Option<String>> {
        let email: Option<Option<String>> =
            sqlx::query_scalar("SELECT email FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(email
            .flatten()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()))
    }

    /// Change a user's stored role.
    pub async fn update_role(&self, id: i64, role: Role) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a user by ID.
    ///
    /// Overrides and hosted resources are removed with the user.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
