//! Repository for the `users` table.
//!
//! Notification preferences are columns on the profile row; there is no
//! separate preference table.

use herald_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::user::{CreateUser, DigestSubscriber, UpdatePreferences, UserProfile};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, display_name, last_login_at, deleted_at, \
    notifications_enabled, notifications_summarized, summary_time, \
    dm_notifications_enabled, job_fair_notifications_enabled, \
    community_notifications_enabled, created_at, updated_at";

/// Provides profile and preference operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user with default preferences, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<UserProfile, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, display_name)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserProfile>(&query)
            .bind(&input.username)
            .bind(&input.display_name)
            .fetch_one(pool)
            .await
    }

    /// Find a user by username (case-sensitive). Soft-deleted users are
    /// returned too; callers decide what deletion means for them.
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, UserProfile>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Update notification preferences. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no user with the given username exists.
    pub async fn update_preferences(
        pool: &PgPool,
        username: &str,
        input: &UpdatePreferences,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                notifications_enabled = COALESCE($2, notifications_enabled),
                notifications_summarized = COALESCE($3, notifications_summarized),
                summary_time = COALESCE($4, summary_time),
                dm_notifications_enabled = COALESCE($5, dm_notifications_enabled),
                job_fair_notifications_enabled = COALESCE($6, job_fair_notifications_enabled),
                community_notifications_enabled = COALESCE($7, community_notifications_enabled),
                updated_at = NOW()
             WHERE username = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserProfile>(&query)
            .bind(username)
            .bind(input.enabled)
            .bind(input.summarized)
            .bind(&input.summary_time)
            .bind(input.dm_enabled)
            .bind(input.job_fair_enabled)
            .bind(input.community_enabled)
            .fetch_optional(pool)
            .await
    }

    /// Users with notifications enabled and digest mode selected.
    pub async fn list_digest_subscribers(
        pool: &PgPool,
    ) -> Result<Vec<DigestSubscriber>, sqlx::Error> {
        sqlx::query_as::<_, DigestSubscriber>(
            "SELECT username, summary_time FROM users
             WHERE notifications_enabled AND notifications_summarized
               AND deleted_at IS NULL
             ORDER BY username",
        )
        .fetch_all(pool)
        .await
    }

    /// Record a login.
    pub async fn touch_last_login(
        pool: &PgPool,
        username: &str,
        at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = $2 WHERE username = $1")
            .bind(username)
            .bind(at)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a user by setting `deleted_at`.
    ///
    /// Returns `true` if the row was updated, `false` if already deleted.
    pub async fn soft_delete(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW() WHERE username = $1 AND deleted_at IS NULL",
        )
        .bind(username)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
