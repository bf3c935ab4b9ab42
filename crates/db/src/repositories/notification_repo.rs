//! Repository for the `notifications` table.

use herald_core::notification::{NewNotification, Notification};
use herald_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::notification::{NotificationFilter, NotificationRow, UnreadCounts};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, recipient, category, title, message, related_id, \
    window_start, window_end, is_read, read_at, created_at";

/// Provides the notification store operations.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Persist a new notification and return it as stored.
    ///
    /// A digest is stamped with the end of its window so the next run's
    /// checkpoint lines up exactly with the window it closed.
    pub async fn create(pool: &PgPool, new: &NewNotification) -> Result<Notification, sqlx::Error> {
        let (window_start, window_end) = new.kind.window().unzip();
        let query = format!(
            "INSERT INTO notifications \
                (recipient, category, title, message, related_id, \
                 window_start, window_end, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($7, NOW())) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationRow>(&query)
            .bind(&new.recipient)
            .bind(new.kind.storage_category().as_str())
            .bind(&new.title)
            .bind(&new.message)
            .bind(new.kind.related_id())
            .bind(window_start)
            .bind(window_end)
            .fetch_one(pool)
            .await
            .map(Notification::from)
    }

    /// List notifications for a recipient, newest first.
    ///
    /// When `unread_only` is `true`, only notifications with `is_read = false`
    /// are returned.
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient: &str,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let filter = if unread_only {
            "AND is_read = false"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE recipient = $1 {filter} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&query)
            .bind(recipient)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    /// Find a notification owned by `recipient`.
    pub async fn find_for_recipient(
        pool: &PgPool,
        id: DbId,
        recipient: &str,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM notifications WHERE id = $1 AND recipient = $2");
        let row = sqlx::query_as::<_, NotificationRow>(&query)
            .bind(id)
            .bind(recipient)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Notification::from))
    }

    /// Mark a single notification as read.
    ///
    /// Idempotent: an already-read notification is returned unchanged. Returns
    /// `None` if the notification does not exist for the given recipient.
    pub async fn mark_read(
        pool: &PgPool,
        id: DbId,
        recipient: &str,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query = format!(
            "UPDATE notifications \
             SET is_read = true, read_at = COALESCE(read_at, NOW()) \
             WHERE id = $1 AND recipient = $2 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, NotificationRow>(&query)
            .bind(id)
            .bind(recipient)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Notification::from))
    }

    /// Mark all unread notifications as read for a recipient.
    ///
    /// Returns the number of notifications that were marked read.
    pub async fn mark_all_read(pool: &PgPool, recipient: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = NOW() \
             WHERE recipient = $1 AND is_read = false",
        )
        .bind(recipient)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete every notification addressed to a recipient.
    ///
    /// Returns the number of notifications removed.
    pub async fn clear_all(pool: &PgPool, recipient: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE recipient = $1")
            .bind(recipient)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Unread totals, with digests counted separately from ordinary events.
    pub async fn unread_counts(pool: &PgPool, recipient: &str) -> Result<UnreadCounts, sqlx::Error> {
        sqlx::query_as::<_, UnreadCounts>(
            "SELECT \
                COUNT(*) FILTER (WHERE NOT is_digest) AS unread, \
                COUNT(*) FILTER (WHERE is_digest) AS unread_summaries \
             FROM notifications \
             WHERE recipient = $1 AND is_read = false",
        )
        .bind(recipient)
        .fetch_one(pool)
        .await
    }

    /// `created_at` of the most recent digest created at or before `at`.
    pub async fn latest_digest_at_or_before(
        pool: &PgPool,
        recipient: &str,
        at: Timestamp,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT MAX(created_at) FROM notifications \
             WHERE recipient = $1 AND is_digest AND created_at <= $2",
        )
        .bind(recipient)
        .bind(at)
        .fetch_one(pool)
        .await
    }

    /// Count ordinary notifications matching `filter` created in `(since, until]`.
    pub async fn count_since(
        pool: &PgPool,
        filter: &NotificationFilter<'_>,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE recipient = $1 \
               AND NOT is_digest \
               AND ($2::text IS NULL OR category = $2) \
               AND ($3::bigint IS NULL OR related_id = $3) \
               AND created_at > $4 AND created_at <= $5",
        )
        .bind(filter.recipient)
        .bind(filter.category.map(|c| c.as_str()))
        .bind(filter.related_id)
        .bind(since)
        .bind(until)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }
}
