//! Repository for the `communities` and `questions` tables.

use herald_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::community::{Community, Question};

const QUESTION_COLUMNS: &str = "id, community_id, title, asked_by, asked_at";

/// Provides community reads for the summary aggregator.
pub struct CommunityRepo;

impl CommunityRepo {
    pub async fn create(pool: &PgPool, name: &str) -> Result<Community, sqlx::Error> {
        sqlx::query_as::<_, Community>(
            "INSERT INTO communities (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(pool)
        .await
    }

    pub async fn insert_question(
        pool: &PgPool,
        community_id: DbId,
        title: &str,
        asked_by: &str,
        asked_at: Timestamp,
    ) -> Result<Question, sqlx::Error> {
        let query = format!(
            "INSERT INTO questions (community_id, title, asked_by, asked_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {QUESTION_COLUMNS}"
        );
        sqlx::query_as::<_, Question>(&query)
            .bind(community_id)
            .bind(title)
            .bind(asked_by)
            .bind(asked_at)
            .fetch_one(pool)
            .await
    }

    /// All communities, ordered by name.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Community>, sqlx::Error> {
        sqlx::query_as::<_, Community>(
            "SELECT id, name, created_at FROM communities ORDER BY name, id",
        )
        .fetch_all(pool)
        .await
    }

    /// Questions asked in `(since, until]` by anyone other than `exclude_author`,
    /// oldest first.
    pub async fn questions_since(
        pool: &PgPool,
        community_id: DbId,
        exclude_author: &str,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<Question>, sqlx::Error> {
        let query = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions
             WHERE community_id = $1 AND asked_by <> $2
               AND asked_at > $3 AND asked_at <= $4
             ORDER BY asked_at, id"
        );
        sqlx::query_as::<_, Question>(&query)
            .bind(community_id)
            .bind(exclude_author)
            .bind(since)
            .bind(until)
            .fetch_all(pool)
            .await
    }
}
