//! Repository for the `chats` and `chat_messages` tables.

use herald_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::chat::ChatPeer;

/// Provides the chat reads the summary aggregator needs, plus inserts for
/// seeding.
pub struct ChatRepo;

impl ChatRepo {
    /// Open a chat between two users, returning its id.
    pub async fn create(pool: &PgPool, a: &str, b: &str) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO chats (participant_a, participant_b) VALUES ($1, $2) RETURNING id",
        )
        .bind(a)
        .bind(b)
        .fetch_one(pool)
        .await
    }

    /// Append a message to a chat, returning its id.
    pub async fn insert_message(
        pool: &PgPool,
        chat_id: DbId,
        sender: &str,
        body: &str,
        sent_at: Timestamp,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO chat_messages (chat_id, sender, body, sent_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(chat_id)
        .bind(sender)
        .bind(body)
        .bind(sent_at)
        .fetch_one(pool)
        .await
    }

    /// Every chat `username` takes part in, seen from their side.
    pub async fn list_for_participant(
        pool: &PgPool,
        username: &str,
    ) -> Result<Vec<ChatPeer>, sqlx::Error> {
        sqlx::query_as::<_, ChatPeer>(
            "SELECT c.id AS chat_id,
                    u.username AS other_username,
                    COALESCE(u.display_name, u.username) AS other_display_name,
                    (u.deleted_at IS NOT NULL) AS other_deleted
             FROM chats c
             JOIN users u ON u.username =
                 CASE WHEN c.participant_a = $1 THEN c.participant_b ELSE c.participant_a END
             WHERE c.participant_a = $1 OR c.participant_b = $1
             ORDER BY c.id",
        )
        .bind(username)
        .fetch_all(pool)
        .await
    }

    /// Count messages in `(since, until]` not sent by `exclude_sender`.
    pub async fn count_messages_since(
        pool: &PgPool,
        chat_id: DbId,
        exclude_sender: &str,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM chat_messages
             WHERE chat_id = $1 AND sender <> $2
               AND sent_at > $3 AND sent_at <= $4",
        )
        .bind(chat_id)
        .bind(exclude_sender)
        .bind(since)
        .bind(until)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }
}
