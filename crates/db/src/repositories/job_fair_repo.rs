//! Repository for the `job_fairs` and `job_fair_participants` tables.

use herald_core::types::DbId;
use sqlx::PgPool;

use crate::models::job_fair::{CreateJobFair, JobFair};

const COLUMNS: &str = "id, name, status, starts_at, ends_at, created_at";

/// Provides job fair reads for the summary aggregator.
pub struct JobFairRepo;

impl JobFairRepo {
    pub async fn create(pool: &PgPool, input: &CreateJobFair) -> Result<JobFair, sqlx::Error> {
        let query = format!(
            "INSERT INTO job_fairs (name, status, starts_at, ends_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobFair>(&query)
            .bind(&input.name)
            .bind(input.status.as_str())
            .bind(input.starts_at)
            .bind(input.ends_at)
            .fetch_one(pool)
            .await
    }

    /// Register `username` for a fair. Registering twice is a no-op.
    pub async fn add_participant(
        pool: &PgPool,
        job_fair_id: DbId,
        username: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO job_fair_participants (job_fair_id, username)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(job_fair_id)
        .bind(username)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Fairs `username` participates in, ordered by start time.
    pub async fn list_for_participant(
        pool: &PgPool,
        username: &str,
    ) -> Result<Vec<JobFair>, sqlx::Error> {
        sqlx::query_as::<_, JobFair>(
            "SELECT f.id, f.name, f.status, f.starts_at, f.ends_at, f.created_at
             FROM job_fairs f
             JOIN job_fair_participants p ON p.job_fair_id = f.id
             WHERE p.username = $1
             ORDER BY f.starts_at, f.id",
        )
        .bind(username)
        .fetch_all(pool)
        .await
    }
}
