//! Fire-and-forget dispatch of limit notices.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use super::{LimitNotice, LimitNotifier};
use crate::db::UserRepository;
use crate::Database;

/// Resolves the user's address and hands the notice to a [`LimitNotifier`]
/// on a background task.
#[derive(Clone)]
pub struct NotificationDispatcher {
    db: Database,
    notifier: Arc<dyn LimitNotifier>,
    enabled: bool,
}

impl NotificationDispatcher {
    /// Create an enabled dispatcher.
    pub fn new(db: Database, notifier: Arc<dyn LimitNotifier>) -> Self {
        Self {
            db,
            notifier,
            enabled: true,
        }
    }

    /// Turn dispatch on or off.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Send a notice to a user in the background.
    ///
    /// Returns the delivery task, or `None` when notifications are off.
    /// The task never fails; lookup and delivery errors are logged and dropped.
    pub fn dispatch(&self, user_id: i64, notice: LimitNotice) -> Option<JoinHandle<()>> {
        if !self.enabled {
            debug!(user_id, limit = %notice.limit_name, "Limit notice suppressed");
            return None;
        }

        let this = self.clone();
        Some(tokio::spawn(async move {
            this.deliver(user_id, &notice).await;
        }))
    }

    async fn deliver(&self, user_id: i64, notice: &LimitNotice) {
        let to = match UserRepository::new(self.db.pool()).email_for(user_id).await {
            Ok(Some(to)) => to,
            Ok(None) => {
                debug!(user_id, "No address on file, limit notice skipped");
                return;
            }
            Err(e) => {
                debug!(user_id, "Address lookup for limit notice failed: {}", e);
                return;
            }
        };

        if let Err(e) = self.notifier.notify(&to, notice).await {
            debug!(user_id, "Limit notice delivery failed: {}", e);
        }
    }
}
