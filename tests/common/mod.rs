//! Test helpers for policy integration tests.
//!
//! Provides an engine over an in-memory database, a recording notifier and
//! helpers to seed users and resources.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::time::timeout;

use stowage::db::{NewUser, Role, UserRepository};
use stowage::notify::{LimitNotice, LimitNotifier};
use stowage::policy::{PolicyEngine, PolicyOptions, ServerSettings};
use stowage::resource::{FileRecordRepository, NewFileRecord, NewShortLink, ShortLinkRepository};
use stowage::{Database, Result, BYTES_PER_MB};

/// How long to wait for a background notification.
pub const NOTICE_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait before concluding no notification was sent.
pub const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Notifier that forwards every notice to a channel.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<(String, LimitNotice)>,
}

impl LimitNotifier for RecordingNotifier {
    fn notify<'a>(&'a self, to: &'a str, notice: &'a LimitNotice) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let _ = self.tx.send((to.to_string(), notice.clone()));
            Ok(())
        })
    }
}

/// An engine with its database and the notices it sent.
pub struct TestEngine {
    pub db: Database,
    pub engine: PolicyEngine,
    pub notices: mpsc::UnboundedReceiver<(String, LimitNotice)>,
}

impl TestEngine {
    /// Wait for the next notice.
    pub async fn next_notice(&mut self) -> Option<(String, LimitNotice)> {
        timeout(NOTICE_TIMEOUT, self.notices.recv())
            .await
            .ok()
            .flatten()
    }

    /// Check that no notice arrives within the quiet period.
    pub async fn assert_no_notice(&mut self) {
        if let Ok(Some(notice)) = timeout(QUIET_PERIOD, self.notices.recv()).await {
            panic!("unexpected notice: {notice:?}");
        }
    }
}

/// Engine with fixed settings and notifications on.
pub async fn test_engine(settings: ServerSettings) -> TestEngine {
    test_engine_with(settings, PolicyOptions::default()).await
}

/// Engine with fixed settings and the given options.
pub async fn test_engine_with(settings: ServerSettings, options: PolicyOptions) -> TestEngine {
    let db = Database::open_in_memory().await.unwrap();
    let (tx, notices) = mpsc::unbounded_channel();
    let engine = PolicyEngine::new(
        db.clone(),
        Arc::new(settings),
        Arc::new(RecordingNotifier { tx }),
        options,
    );
    TestEngine {
        db,
        engine,
        notices,
    }
}

/// The settings used throughout the upload scenarios.
pub fn scenario_settings() -> ServerSettings {
    ServerSettings {
        max_upload_mb: Some(500),
        max_files_per_upload: Some(5),
        user_daily_quota_mb: Some(1024),
        user_max_storage_mb: Some(5120),
        ..ServerSettings::default()
    }
}

/// Create a user with an email address and return the user ID.
pub async fn create_test_user(db: &Database, username: &str) -> i64 {
    let user = NewUser::new(username).with_email(format!("{username}@example.com"));
    UserRepository::new(db.pool())
        .create(&user)
        .await
        .unwrap()
        .id
}

/// Create a user without an email address.
pub async fn create_silent_user(db: &Database, username: &str) -> i64 {
    UserRepository::new(db.pool())
        .create(&NewUser::new(username).with_role(Role::User))
        .await
        .unwrap()
        .id
}

/// Store a file of `mb` megabytes uploaded now.
pub async fn add_file_mb(db: &Database, user_id: i64, mb: u64) {
    add_file_bytes(db, user_id, (mb * BYTES_PER_MB) as i64).await;
}

/// Store a file of `bytes` bytes uploaded now.
pub async fn add_file_bytes(db: &Database, user_id: i64, bytes: i64) {
    FileRecordRepository::new(db.pool())
        .create(&NewFileRecord::new(user_id, "upload.bin", "stored.bin", bytes))
        .await
        .unwrap();
}

/// Store a file of `mb` megabytes uploaded two days ago.
pub async fn add_old_file_mb(db: &Database, user_id: i64, mb: u64) {
    let at = chrono::Utc::now() - chrono::TimeDelta::days(2);
    FileRecordRepository::new(db.pool())
        .create(
            &NewFileRecord::new(user_id, "old.bin", "old.bin", (mb * BYTES_PER_MB) as i64)
                .created_at(at),
        )
        .await
        .unwrap();
}

static NEXT_SLUG: AtomicUsize = AtomicUsize::new(0);

/// Store `count` short links.
pub async fn add_short_links(db: &Database, user_id: i64, count: usize) {
    let repo = ShortLinkRepository::new(db.pool());
    for _ in 0..count {
        let n = NEXT_SLUG.fetch_add(1, Ordering::Relaxed);
        repo.create(&NewShortLink::new(
            user_id,
            format!("https://example.com/{n}"),
            format!("s{n}"),
        ))
        .await
        .unwrap();
    }
}
