//! Data access seam for the summary aggregator.
//!
//! [`SummaryStore`] lists exactly the reads and the single write a digest
//! run needs. [`PgSummaryStore`] implements it over the `herald-db`
//! repositories; tests substitute an in-memory store.

use async_trait::async_trait;
use herald_core::notification::{Category, NewNotification, Notification};
use herald_core::types::{DbId, Timestamp};
use herald_db::models::chat::ChatPeer;
use herald_db::models::community::{Community, Question};
use herald_db::models::job_fair::JobFair;
use herald_db::models::notification::NotificationFilter;
use herald_db::models::user::UserProfile;
use herald_db::repositories::{ChatRepo, CommunityRepo, JobFairRepo, NotificationRepo, UserRepo};
use herald_db::DbPool;

/// Reads and writes performed by a digest run.
///
/// Every window is `(since, until]`.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    async fn profile(&self, username: &str) -> Result<Option<UserProfile>, sqlx::Error>;

    /// `created_at` of the user's latest digest at or before `at`.
    async fn latest_digest_at_or_before(
        &self,
        username: &str,
        at: Timestamp,
    ) -> Result<Option<Timestamp>, sqlx::Error>;

    async fn chats(&self, username: &str) -> Result<Vec<ChatPeer>, sqlx::Error>;

    /// Messages in a chat not sent by `exclude_sender`.
    async fn count_chat_messages(
        &self,
        chat_id: DbId,
        exclude_sender: &str,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<i64, sqlx::Error>;

    async fn job_fairs(&self, username: &str) -> Result<Vec<JobFair>, sqlx::Error>;

    /// `jobFair` notifications the user received about one fair.
    async fn count_job_fair_updates(
        &self,
        username: &str,
        job_fair_id: DbId,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<i64, sqlx::Error>;

    async fn communities(&self) -> Result<Vec<Community>, sqlx::Error>;

    /// Questions in a community not asked by `exclude_author`.
    async fn questions(
        &self,
        community_id: DbId,
        exclude_author: &str,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<Question>, sqlx::Error>;

    async fn find_notification(
        &self,
        id: DbId,
        username: &str,
    ) -> Result<Option<Notification>, sqlx::Error>;

    async fn create_digest(&self, digest: &NewNotification) -> Result<Notification, sqlx::Error>;
}

/// [`SummaryStore`] over PostgreSQL.
#[derive(Clone)]
pub struct PgSummaryStore {
    pool: DbPool,
}

impl PgSummaryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SummaryStore for PgSummaryStore {
    async fn profile(&self, username: &str) -> Result<Option<UserProfile>, sqlx::Error> {
        UserRepo::find_by_username(&self.pool, username).await
    }

    async fn latest_digest_at_or_before(
        &self,
        username: &str,
        at: Timestamp,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        NotificationRepo::latest_digest_at_or_before(&self.pool, username, at).await
    }

    async fn chats(&self, username: &str) -> Result<Vec<ChatPeer>, sqlx::Error> {
        ChatRepo::list_for_participant(&self.pool, username).await
    }

    async fn count_chat_messages(
        &self,
        chat_id: DbId,
        exclude_sender: &str,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        ChatRepo::count_messages_since(&self.pool, chat_id, exclude_sender, since, until).await
    }

    async fn job_fairs(&self, username: &str) -> Result<Vec<JobFair>, sqlx::Error> {
        JobFairRepo::list_for_participant(&self.pool, username).await
    }

    async fn count_job_fair_updates(
        &self,
        username: &str,
        job_fair_id: DbId,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let filter = NotificationFilter::for_recipient(username)
            .category(Category::JobFair)
            .related_to(job_fair_id);
        NotificationRepo::count_since(&self.pool, &filter, since, until).await
    }

    async fn communities(&self) -> Result<Vec<Community>, sqlx::Error> {
        CommunityRepo::list_all(&self.pool).await
    }

    async fn questions(
        &self,
        community_id: DbId,
        exclude_author: &str,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<Question>, sqlx::Error> {
        CommunityRepo::questions_since(&self.pool, community_id, exclude_author, since, until)
            .await
    }

    async fn find_notification(
        &self,
        id: DbId,
        username: &str,
    ) -> Result<Option<Notification>, sqlx::Error> {
        NotificationRepo::find_for_recipient(&self.pool, id, username).await
    }

    async fn create_digest(&self, digest: &NewNotification) -> Result<Notification, sqlx::Error> {
        NotificationRepo::create(&self.pool, digest).await
    }
}
