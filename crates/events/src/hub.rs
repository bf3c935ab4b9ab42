//! In-process notification hub backed by a `tokio::sync::broadcast` channel.
//!
//! Every notification that is persisted and should reach a connected client
//! goes through [`NotificationHub::publish`]. Relays subscribe and address
//! each notification to its recipient's live connections, which gives every
//! user their own room without the hub knowing about connections at all.

use herald_core::notification::Notification;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out hub for stored notifications.
///
/// Shared via `Arc<NotificationHub>` across the application.
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl NotificationHub {
    /// Create a hub with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unconsumed notifications are
    /// dropped and slow receivers observe `RecvError::Lagged`. Clients
    /// recover those through polling.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a notification to every current subscriber.
    ///
    /// Returns the number of subscribers that received it. With no
    /// subscribers the notification is dropped; it is already in the store.
    pub fn publish(&self, notification: Notification) -> usize {
        self.sender.send(notification).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use herald_core::notification::{Category, NotificationKind};

    use super::*;

    fn notification(id: i64, recipient: &str) -> Notification {
        Notification {
            id,
            recipient: recipient.into(),
            kind: NotificationKind::Ordinary {
                category: Category::Dm,
                related_id: Some(1),
            },
            title: "New message".into(),
            message: "hi".into(),
            read: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn every_subscriber_receives_each_notification() {
        let hub = NotificationHub::default();
        let mut rx1 = hub.subscribe();
        let mut rx2 = hub.subscribe();

        assert_eq!(hub.publish(notification(1, "bob")), 2);

        assert_eq!(rx1.recv().await.unwrap().id, 1);
        assert_eq!(rx2.recv().await.unwrap().recipient, "bob");
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let hub = NotificationHub::default();
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.publish(notification(1, "bob")), 0);
    }

    #[tokio::test]
    async fn slow_subscriber_observes_lag() {
        let hub = NotificationHub::new(2);
        let mut rx = hub.subscribe();
        for id in 1..=3 {
            hub.publish(notification(id, "bob"));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(rx.recv().await.unwrap().id, 2);
    }
}
