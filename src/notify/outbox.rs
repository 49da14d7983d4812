//! Limit mail queued in the outbox table.
//!
//! An external mailer drains `mail_outbox` and marks rows as sent.

use futures::future::BoxFuture;

use super::{LimitNotice, LimitNotifier};
use crate::db::DbPool;
use crate::{Database, Result, StowageError};

/// Subject template for limit-reached mail.
pub const LIMIT_MAIL_SUBJECT: &str = "You have reached a limit: {limit_name}";

/// Body template for limit-reached mail.
pub const LIMIT_MAIL_BODY: &str = r#"
Hello,

Your account has reached one of its limits.

Limit:   {limit_name}
Details: {details}

The request that hit this limit was not completed. Free up some space,
wait for your daily quota to reset, or ask an administrator to raise
your limits.

This message was sent automatically.
"#;

/// A queued mail.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OutboxMail {
    pub id: i64,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub created_at: String,
    pub sent_at: Option<String>,
}

/// Repository for the outbox.
pub struct OutboxRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> OutboxRepository<'a> {
    /// Create a new OutboxRepository.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Queue a mail.
    pub async fn enqueue(&self, recipient: &str, subject: &str, body: &str) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO mail_outbox (recipient, subject, body) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(recipient)
        .bind(subject)
        .bind(body)
        .fetch_one(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(id)
    }

    /// Mail not yet sent, oldest first.
    pub async fn list_pending(&self) -> Result<Vec<OutboxMail>> {
        let mails = sqlx::query_as::<_, OutboxMail>(
            "SELECT id, recipient, subject, body, created_at, sent_at
             FROM mail_outbox WHERE sent_at IS NULL ORDER BY id",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(mails)
    }

    /// Mark a mail as sent. Returns false if it was unknown or already sent.
    pub async fn mark_sent(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE mail_outbox SET sent_at = datetime('now') WHERE id = ? AND sent_at IS NULL",
        )
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

/// [`LimitNotifier`] that renders the limit mail into the outbox.
#[derive(Clone)]
pub struct OutboxNotifier {
    db: Database,
}

impl OutboxNotifier {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn render(template: &str, notice: &LimitNotice) -> String {
        template
            .replace("{limit_name}", &notice.limit_name)
            .replace("{details}", &notice.details)
            .trim()
            .to_string()
    }
}

impl LimitNotifier for OutboxNotifier {
    fn notify<'a>(&'a self, to: &'a str, notice: &'a LimitNotice) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let subject = Self::render(LIMIT_MAIL_SUBJECT, notice);
            let body = Self::render(LIMIT_MAIL_BODY, notice);
            OutboxRepository::new(self.db.pool())
                .enqueue(to, &subject, &body)
                .await?;
            Ok(())
        })
    }
}
