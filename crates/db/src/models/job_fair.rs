//! Job fair models read by the summary aggregator.

use herald_core::job_fair::JobFairStatus;
use herald_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `job_fairs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobFair {
    pub id: DbId,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub status: JobFairStatus,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for creating a job fair.
#[derive(Debug, Clone)]
pub struct CreateJobFair {
    pub name: String,
    pub status: JobFairStatus,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
}
