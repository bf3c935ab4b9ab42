//! Community and question models read by the summary aggregator.

use herald_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `communities` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Community {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

/// A row from the `questions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: DbId,
    pub community_id: DbId,
    pub title: String,
    pub asked_by: String,
    pub asked_at: Timestamp,
}
