//! Store-then-publish entry point for notification producers.

use std::sync::Arc;

use herald_core::notification::{NewNotification, Notification};
use herald_db::repositories::NotificationRepo;
use herald_db::DbPool;

use crate::hub::NotificationHub;

/// Persists notifications and hands them to the [`NotificationHub`].
///
/// A notification is always written before it is published, so a client
/// that misses the push still finds it on its next poll.
#[derive(Clone)]
pub struct NotificationService {
    pool: DbPool,
    hub: Arc<NotificationHub>,
}

impl NotificationService {
    pub fn new(pool: DbPool, hub: Arc<NotificationHub>) -> Self {
        Self { pool, hub }
    }

    /// Store a notification and push it to the recipient's connections.
    pub async fn notify(&self, new: &NewNotification) -> Result<Notification, sqlx::Error> {
        let notification = NotificationRepo::create(&self.pool, new).await?;
        let delivered = self.hub.publish(notification.clone());
        tracing::debug!(
            notification_id = notification.id,
            recipient = %notification.recipient,
            digest = notification.is_digest(),
            relays = delivered,
            "Notification stored and published"
        );
        Ok(notification)
    }

    /// Push an already-stored notification, e.g. a digest written by the
    /// summary aggregator.
    pub fn publish(&self, notification: &Notification) {
        self.hub.publish(notification.clone());
    }
}
