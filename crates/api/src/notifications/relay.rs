//! Hub-to-WebSocket relay.

use std::sync::Arc;

use axum::extract::ws::Message;
use herald_core::notification::Notification;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::ws::WsManager;

/// Wire shape of a push frame: `{"type":"notification","data":{...}}`.
#[derive(Serialize)]
struct PushFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: &'a Notification,
}

/// Serialize a notification as a push frame.
pub fn push_frame(notification: &Notification) -> Result<String, serde_json::Error> {
    serde_json::to_string(&PushFrame {
        kind: "notification",
        data: notification,
    })
}

/// Forwards hub notifications to WebSocket rooms.
pub struct PushRelay {
    ws_manager: Arc<WsManager>,
}

impl PushRelay {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run until `cancel` fires or the hub is dropped.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<Notification>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Push relay cancelled");
                    break;
                }
                msg = receiver.recv() => match msg {
                    Ok(notification) => self.deliver(&notification).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Clients recover missed notifications on their next poll.
                        tracing::warn!(skipped = n, "Push relay lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Notification hub closed, push relay shutting down");
                        break;
                    }
                },
            }
        }
    }

    async fn deliver(&self, notification: &Notification) {
        let frame = match push_frame(notification) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(notification_id = notification.id, error = %e, "Failed to encode push frame");
                return;
            }
        };
        let sent = self
            .ws_manager
            .send_to_user(&notification.recipient, Message::Text(frame.into()))
            .await;
        tracing::debug!(
            user = %notification.recipient,
            notification_id = notification.id,
            connections = sent,
            "Notification pushed"
        );
    }
}
