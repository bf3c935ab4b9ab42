//! Digest message composition and the structured summary breakdown.
//!
//! [`compose_summary`] turns per-category counts into the single prose
//! message carried by a digest notification. [`SummaryBreakdown`] is the
//! structured companion returned when a client drills into a digest.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::job_fair::JobFairStatus;
use crate::notification::DIGEST_MESSAGE_PREFIX;
use crate::types::{DbId, Timestamp};

/// How far ahead an upcoming job fair counts as "starting soon", in hours.
pub const STARTING_SOON_HOURS: i64 = 24;

pub fn starting_soon_horizon() -> Duration {
    Duration::hours(STARTING_SOON_HOURS)
}

// ---------------------------------------------------------------------------
// Counts and composition
// ---------------------------------------------------------------------------

/// Everything a digest run counted, per category.
///
/// The three job fair buckets are independent and are never deduplicated
/// against each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryCounts {
    pub dm_messages: i64,
    pub job_fair_updates: i64,
    pub job_fairs_starting_soon: i64,
    pub job_fairs_ended: i64,
    /// `(community name, new question count)` in display order.
    pub communities: Vec<(String, i64)>,
}

impl SummaryCounts {
    pub fn community_questions(&self) -> i64 {
        self.communities.iter().map(|(_, n)| n).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dm_messages == 0
            && self.job_fair_updates == 0
            && self.job_fairs_starting_soon == 0
            && self.job_fairs_ended == 0
            && self.community_questions() == 0
    }
}

fn pluralize(count: i64, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("1 {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Build the digest message, or `None` when there is nothing to report.
///
/// One clause per non-zero count, joined with `"; "` and prefixed with
/// `"Summary: "`. The community clause carries a `(Name: count, ...)`
/// breakdown of the non-zero communities.
pub fn compose_summary(counts: &SummaryCounts) -> Option<String> {
    let mut clauses = Vec::new();

    if counts.dm_messages > 0 {
        clauses.push(pluralize(counts.dm_messages, "new DM message", "new DM messages"));
    }
    if counts.job_fair_updates > 0 {
        clauses.push(pluralize(
            counts.job_fair_updates,
            "job fair update",
            "job fair updates",
        ));
    }
    if counts.job_fairs_starting_soon > 0 {
        clauses.push(pluralize(
            counts.job_fairs_starting_soon,
            "job fair starting within 24 hours",
            "job fairs starting within 24 hours",
        ));
    }
    if counts.job_fairs_ended > 0 {
        clauses.push(pluralize(
            counts.job_fairs_ended,
            "job fair recently ended",
            "job fairs recently ended",
        ));
    }

    let questions = counts.community_questions();
    if questions > 0 {
        let per_community = counts
            .communities
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(name, n)| format!("{name}: {n}"))
            .collect::<Vec<_>>()
            .join(", ");
        clauses.push(format!(
            "{} ({per_community})",
            pluralize(
                questions,
                "new question in followed communities",
                "new questions in followed communities",
            )
        ));
    }

    if clauses.is_empty() {
        return None;
    }
    Some(format!("{DIGEST_MESSAGE_PREFIX} {}", clauses.join("; ")))
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// Structured detail behind one digest window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBreakdown {
    pub window_start: Timestamp,
    pub window_end: Timestamp,
    pub chats: Vec<ChatActivity>,
    pub communities: Vec<CommunityActivity>,
    pub job_fairs: Vec<JobFairActivity>,
}

impl SummaryBreakdown {
    /// Reduce the breakdown to the counts a digest message is built from.
    pub fn counts(&self) -> SummaryCounts {
        let mut counts = SummaryCounts {
            dm_messages: self.chats.iter().map(|c| c.message_count).sum(),
            communities: self
                .communities
                .iter()
                .map(|c| (c.name.clone(), c.questions.len() as i64))
                .collect(),
            ..Default::default()
        };
        for fair in &self.job_fairs {
            match fair.reason {
                JobFairReason::Update { count } => counts.job_fair_updates += count,
                JobFairReason::StartingSoon { .. } => counts.job_fairs_starting_soon += 1,
                JobFairReason::Ended { .. } => counts.job_fairs_ended += 1,
            }
        }
        counts
    }
}

/// New messages in one chat from the other participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatActivity {
    pub chat_id: DbId,
    pub other_participant: String,
    /// The other participant's account has been soft-deleted.
    pub other_participant_deleted: bool,
    pub message_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityActivity {
    pub community_id: DbId,
    pub name: String,
    pub questions: Vec<QuestionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummary {
    pub id: DbId,
    pub title: String,
    pub author: String,
    pub asked_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFairActivity {
    pub job_fair_id: DbId,
    pub name: String,
    pub status: JobFairStatus,
    pub reason: JobFairReason,
}

/// Which job fair bucket an entry was counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum JobFairReason {
    /// Status-change notifications recorded for the fair.
    Update { count: i64 },
    /// Upcoming and starting within the next 24 hours.
    StartingSoon { starts_at: Timestamp },
    /// Ended after the checkpoint.
    Ended { ended_at: Timestamp },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
