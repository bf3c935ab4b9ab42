//! Digest scheduler.
//!
//! [`DigestScheduler`] runs as a background task. Every tick it lists the
//! users who opted into digests, picks those whose summary time (UTC) has
//! passed today and who have not been processed today, runs the
//! [`SummaryAggregator`] for each, and pushes any digest it created. A user
//! whose run fails stays due and is retried on the next tick.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use herald_core::preferences::SummaryTime;
use herald_core::types::Timestamp;
use herald_db::models::user::DigestSubscriber;
use herald_db::repositories::UserRepo;
use herald_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::service::NotificationService;
use crate::summary::{SummaryAggregator, SummaryOutcome};

/// How often the scheduler checks for due digests.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// DigestScheduler
// ---------------------------------------------------------------------------

/// Background service that produces daily digests.
pub struct DigestScheduler {
    pool: DbPool,
    aggregator: SummaryAggregator,
    service: NotificationService,
    interval: Duration,
    /// Username to the UTC day it was last processed.
    processed: Mutex<HashMap<String, NaiveDate>>,
}

impl DigestScheduler {
    pub fn new(pool: DbPool, aggregator: SummaryAggregator, service: NotificationService) -> Self {
        Self {
            pool,
            aggregator,
            service,
            interval: DEFAULT_CHECK_INTERVAL,
            processed: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the scheduler loop until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        tracing::info!(interval_secs = self.interval.as_secs(), "Digest scheduler started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Digest scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.process_digests(Utc::now()).await {
                        tracing::error!(error = %e, "Failed to process digests");
                    }
                }
            }
        }
    }

    /// Run the aggregator for every subscriber due at `now`.
    async fn process_digests(&self, now: Timestamp) -> Result<(), sqlx::Error> {
        let subscribers = UserRepo::list_digest_subscribers(&self.pool).await?;
        let due: Vec<String> = {
            let mut processed = self.processed.lock().unwrap_or_else(PoisonError::into_inner);
            let today = now.date_naive();
            processed.retain(|_, day| *day == today);
            select_due(&subscribers, now, &processed)
                .into_iter()
                .map(String::from)
                .collect()
        };

        self.run_due(&due, now).await;
        Ok(())
    }

    /// Run the aggregator for each of `due`. Users whose run fails are left
    /// unprocessed so the next tick retries them. Returns how many digests
    /// were created.
    async fn run_due(&self, due: &[String], now: Timestamp) -> usize {
        let today = now.date_naive();
        let mut created = 0usize;
        for username in due {
            match self.aggregator.run(username, now).await {
                Ok(outcome) => {
                    if let SummaryOutcome::Created(digest) = &outcome {
                        self.service.publish(digest);
                        created += 1;
                    } else {
                        tracing::debug!(user = %username, outcome = outcome.as_str(), "No digest sent");
                    }
                    self.mark_processed(username, today);
                }
                Err(e) => {
                    tracing::error!(user = %username, error = %e, "Failed to build digest for user, will retry");
                }
            }
        }

        if !due.is_empty() {
            tracing::info!(due = due.len(), created, "Processed digest run");
        }
        created
    }

    fn mark_processed(&self, username: &str, day: NaiveDate) {
        self.processed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(username.to_string(), day);
    }
}

/// The subscriber's anchor, falling back to the default on a malformed value.
fn summary_anchor(subscriber: &DigestSubscriber) -> SummaryTime {
    subscriber.summary_time.parse().unwrap_or_else(|_| {
        tracing::warn!(
            user = %subscriber.username,
            summary_time = %subscriber.summary_time,
            fallback = %SummaryTime::DEFAULT,
            "Malformed summary time, using default"
        );
        SummaryTime::DEFAULT
    })
}

/// Subscribers whose anchor has been reached on the day of `now` and who
/// have not been processed that day.
fn select_due<'a>(
    subscribers: &'a [DigestSubscriber],
    now: Timestamp,
    processed: &HashMap<String, NaiveDate>,
) -> Vec<&'a str> {
    let today = now.date_naive();
    subscribers
        .iter()
        .filter(|s| processed.get(&s.username) != Some(&today))
        .filter(|s| summary_anchor(s).reached_by(now))
        .map(|s| s.username.as_str())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
