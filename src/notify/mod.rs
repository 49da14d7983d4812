//! Limit-reached notifications.
//!
//! Notifications are advisory. They are sent in the background after a
//! denial and never influence, delay or fail the policy decision.

mod dispatcher;
mod outbox;

pub use dispatcher::NotificationDispatcher;
pub use outbox::{
    OutboxMail, OutboxNotifier, OutboxRepository, LIMIT_MAIL_BODY, LIMIT_MAIL_SUBJECT,
};

use futures::future::BoxFuture;

use crate::error::LimitPolicyError;
use crate::Result;

/// What limit was hit, in user-facing words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitNotice {
    /// Short name of the limit, e.g. "Daily upload quota".
    pub limit_name: String,
    /// One-line explanation with the figures involved.
    pub details: String,
}

impl LimitNotice {
    pub fn new(limit_name: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            limit_name: limit_name.into(),
            details: details.into(),
        }
    }

    /// The notice for a denial, if that kind of denial is worth telling the user about.
    pub fn for_denial(err: &LimitPolicyError) -> Option<Self> {
        err.notice()
            .map(|(limit_name, details)| Self { limit_name, details })
    }
}

/// Delivery channel for limit notices.
///
/// Implementations may fail; the dispatcher discards the error.
pub trait LimitNotifier: Send + Sync {
    /// Deliver a notice to an address.
    fn notify<'a>(&'a self, to: &'a str, notice: &'a LimitNotice) -> BoxFuture<'a, Result<()>>;
}
