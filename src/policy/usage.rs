//! Usage aggregation over the resource store.
//!
//! Every figure is recomputed from the tables on each call. Nothing is
//! cached or locked, so two concurrent decisions may both see the same usage.

use chrono::{DateTime, Utc};

use crate::datetime::{self, DayBounds, Zone};
use crate::db::DbPool;
use crate::resource::ResourceKind;
use crate::{Result, StowageError};

/// Read-only aggregate queries for one database.
pub struct UsageAggregator<'a> {
    pool: &'a DbPool,
    zone: Zone,
}

impl<'a> UsageAggregator<'a> {
    /// Create an aggregator whose "today" is the calendar day in `zone`.
    pub fn new(pool: &'a DbPool, zone: Zone) -> Self {
        Self { pool, zone }
    }

    /// Number of persisted resources of `kind` owned by the user.
    pub async fn count_resources(&self, user_id: i64, kind: ResourceKind) -> Result<u64> {
        let sql = match kind {
            ResourceKind::Files => "SELECT COUNT(*) FROM files WHERE user_id = ?",
            ResourceKind::ShortLink => "SELECT COUNT(*) FROM short_links WHERE user_id = ?",
        };

        let count: i64 = sqlx::query_scalar(sql)
            .bind(user_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(non_negative(count))
    }

    /// Bytes stored across all of the user's files.
    pub async fn total_storage_bytes(&self, user_id: i64) -> Result<u64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(size), 0) FROM files WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(non_negative(total))
    }

    /// Bytes uploaded by the user during the current calendar day.
    pub async fn today_uploaded_bytes(&self, user_id: i64) -> Result<u64> {
        self.uploaded_bytes_on(user_id, Utc::now()).await
    }

    /// Bytes uploaded during the calendar day containing `at`.
    pub async fn uploaded_bytes_on(&self, user_id: i64, at: DateTime<Utc>) -> Result<u64> {
        self.uploaded_bytes_between(user_id, datetime::day_bounds(at, self.zone))
            .await
    }

    /// Bytes of files created within `bounds` (inclusive on both ends).
    pub async fn uploaded_bytes_between(&self, user_id: i64, bounds: DayBounds) -> Result<u64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(size), 0) FROM files
             WHERE user_id = ? AND created_at >= ? AND created_at <= ?",
        )
        .bind(user_id)
        .bind(datetime::to_db(&bounds.start))
        .bind(datetime::to_db(&bounds.end))
        .fetch_one(self.pool)
        .await
        .map_err(|e| StowageError::Database(e.to_string()))?;

        Ok(non_negative(total))
    }
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
