//! Summary aggregator.
//!
//! Builds the once-daily digest for a user: counts everything that happened
//! since the checkpoint, composes one message, and writes at most one
//! digest notification. All reads complete before the single write, so a
//! failed run leaves the store untouched.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use herald_core::checkpoint::CheckpointPolicy;
use herald_core::job_fair::JobFairStatus;
use herald_core::notification::{NewNotification, Notification};
use herald_core::preferences::NotificationPreferences;
use herald_core::summary::{
    compose_summary, starting_soon_horizon, ChatActivity, CommunityActivity, JobFairActivity,
    JobFairReason, QuestionSummary, SummaryBreakdown,
};
use herald_core::types::{DbId, Timestamp};
use serde::Serialize;

use crate::store::SummaryStore;

// ---------------------------------------------------------------------------
// Outcome and errors
// ---------------------------------------------------------------------------

/// Result of a single aggregator run.
#[derive(Debug, Clone)]
pub enum SummaryOutcome {
    /// A digest was written.
    Created(Notification),
    /// The user cannot receive digests; nothing was read beyond the profile.
    NotEligible(NotEligibleReason),
    /// No activity in the window; nothing was written.
    NothingToSummarize,
    /// Another run for the same user is in flight.
    AlreadyRunning,
}

impl SummaryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryOutcome::Created(_) => "created",
            SummaryOutcome::NotEligible(_) => "not_eligible",
            SummaryOutcome::NothingToSummarize => "nothing_to_summarize",
            SummaryOutcome::AlreadyRunning => "already_running",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotEligibleReason {
    UnknownUser,
    Deleted,
    NotificationsDisabled,
    NotSummarized,
}

impl NotEligibleReason {
    pub fn as_str(self) -> &'static str {
        match self {
            NotEligibleReason::UnknownUser => "unknown_user",
            NotEligibleReason::Deleted => "deleted",
            NotEligibleReason::NotificationsDisabled => "notifications_disabled",
            NotEligibleReason::NotSummarized => "not_summarized",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Notification {0} not found")]
    NotFound(DbId),

    #[error("Notification {0} is not a summary")]
    NotADigest(DbId),
}

// ---------------------------------------------------------------------------
// RunGuard
// ---------------------------------------------------------------------------

/// Per-user in-flight set.
///
/// Shared by every caller of [`SummaryAggregator::run`] so the scheduler and
/// on-demand requests never compute the same checkpoint twice.
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    running: Arc<Mutex<HashSet<String>>>,
}

impl RunGuard {
    /// Claim the user, or `None` if a run is already in flight.
    pub fn try_acquire(&self, username: &str) -> Option<RunPermit> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if !running.insert(username.to_string()) {
            return None;
        }
        Some(RunPermit {
            running: Arc::clone(&self.running),
            username: username.to_string(),
        })
    }

    pub fn is_running(&self, username: &str) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(username)
    }
}

/// Releases its user from the [`RunGuard`] on drop.
#[derive(Debug)]
pub struct RunPermit {
    running: Arc<Mutex<HashSet<String>>>,
    username: String,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.username);
    }
}

// ---------------------------------------------------------------------------
// SummaryAggregator
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct SummaryAggregator {
    store: Arc<dyn SummaryStore>,
    policy: CheckpointPolicy,
    guard: RunGuard,
}

impl SummaryAggregator {
    pub fn new(store: Arc<dyn SummaryStore>, policy: CheckpointPolicy) -> Self {
        Self {
            store,
            policy,
            guard: RunGuard::default(),
        }
    }

    pub fn guard(&self) -> &RunGuard {
        &self.guard
    }

    /// Build and store the digest for `username` covering `(checkpoint, now]`.
    pub async fn run(&self, username: &str, now: Timestamp) -> Result<SummaryOutcome, SummaryError> {
        let Some(_permit) = self.guard.try_acquire(username) else {
            tracing::debug!(user = %username, "Summary run already in flight");
            return Ok(SummaryOutcome::AlreadyRunning);
        };

        let Some(profile) = self.store.profile(username).await? else {
            return Ok(SummaryOutcome::NotEligible(NotEligibleReason::UnknownUser));
        };
        if profile.is_deleted() {
            return Ok(SummaryOutcome::NotEligible(NotEligibleReason::Deleted));
        }
        let prefs = profile.preferences();
        if !prefs.enabled {
            return Ok(SummaryOutcome::NotEligible(NotEligibleReason::NotificationsDisabled));
        }
        if !prefs.summarized {
            return Ok(SummaryOutcome::NotEligible(NotEligibleReason::NotSummarized));
        }

        let last_digest = self.store.latest_digest_at_or_before(username, now).await?;
        let since = self.policy.compute(now, last_digest, profile.last_login_at);

        let breakdown = self.collect(username, &prefs, since, now).await?;
        let counts = breakdown.counts();
        let Some(message) = compose_summary(&counts) else {
            tracing::debug!(user = %username, since = %since, "Nothing to summarize");
            return Ok(SummaryOutcome::NothingToSummarize);
        };

        let digest = self
            .store
            .create_digest(&NewNotification::digest(username, message, since, now))
            .await?;

        tracing::info!(
            user = %username,
            notification_id = digest.id,
            dm_messages = counts.dm_messages,
            job_fair_updates = counts.job_fair_updates,
            job_fairs_starting_soon = counts.job_fairs_starting_soon,
            job_fairs_ended = counts.job_fairs_ended,
            community_questions = counts.community_questions(),
            "Summary digest created"
        );
        Ok(SummaryOutcome::Created(digest))
    }

    /// Structured detail behind a stored digest.
    pub async fn breakdown(
        &self,
        username: &str,
        digest_id: DbId,
    ) -> Result<SummaryBreakdown, SummaryError> {
        let notification = self
            .store
            .find_notification(digest_id, username)
            .await?
            .ok_or(SummaryError::NotFound(digest_id))?;
        let (since, until) = notification
            .kind
            .window()
            .ok_or(SummaryError::NotADigest(digest_id))?;
        self.breakdown_since(username, since, until).await
    }

    /// Structured detail of a user's activity in `(since, until]`, gated by
    /// their current category toggles.
    pub async fn breakdown_since(
        &self,
        username: &str,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<SummaryBreakdown, SummaryError> {
        let profile = self
            .store
            .profile(username)
            .await?
            .ok_or_else(|| SummaryError::UnknownUser(username.to_string()))?;
        Ok(self
            .collect(username, &profile.preferences(), since, until)
            .await?)
    }

    async fn collect(
        &self,
        username: &str,
        prefs: &NotificationPreferences,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<SummaryBreakdown, sqlx::Error> {
        let mut breakdown = SummaryBreakdown {
            window_start: since,
            window_end: until,
            chats: Vec::new(),
            communities: Vec::new(),
            job_fairs: Vec::new(),
        };

        if prefs.dm_enabled {
            for chat in self.store.chats(username).await? {
                let count = self
                    .store
                    .count_chat_messages(chat.chat_id, username, since, until)
                    .await?;
                if count > 0 {
                    breakdown.chats.push(ChatActivity {
                        chat_id: chat.chat_id,
                        other_participant: chat.other_display_name,
                        other_participant_deleted: chat.other_deleted,
                        message_count: count,
                    });
                }
            }
        }

        if prefs.job_fair_enabled {
            let horizon = starting_soon_horizon();
            for fair in self.store.job_fairs(username).await? {
                let mut reasons = Vec::new();

                let updates = self
                    .store
                    .count_job_fair_updates(username, fair.id, since, until)
                    .await?;
                if updates > 0 {
                    reasons.push(JobFairReason::Update { count: updates });
                }

                // Reported in the window during which the start entered the
                // 24 hour horizon, so consecutive runs never repeat it.
                if fair.status == JobFairStatus::Upcoming
                    && fair.starts_at > until
                    && fair.starts_at <= until + horizon
                    && fair.starts_at > since + horizon
                {
                    reasons.push(JobFairReason::StartingSoon {
                        starts_at: fair.starts_at,
                    });
                }

                if fair.status == JobFairStatus::Ended
                    && fair.ends_at > since
                    && fair.ends_at <= until
                {
                    reasons.push(JobFairReason::Ended {
                        ended_at: fair.ends_at,
                    });
                }

                breakdown
                    .job_fairs
                    .extend(reasons.into_iter().map(|reason| JobFairActivity {
                        job_fair_id: fair.id,
                        name: fair.name.clone(),
                        status: fair.status,
                        reason,
                    }));
            }
        }

        if prefs.community_enabled {
            for community in self.store.communities().await? {
                let questions = self
                    .store
                    .questions(community.id, username, since, until)
                    .await?;
                if questions.is_empty() {
                    continue;
                }
                breakdown.communities.push(CommunityActivity {
                    community_id: community.id,
                    name: community.name,
                    questions: questions
                        .into_iter()
                        .map(|q| QuestionSummary {
                            id: q.id,
                            title: q.title,
                            author: q.asked_by,
                            asked_at: q.asked_at,
                        })
                        .collect(),
                });
            }
        }

        Ok(breakdown)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
