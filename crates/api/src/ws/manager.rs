//! Per-user push rooms.
//!
//! Every authenticated socket joins the room named after its user. A user
//! with several tabs or devices has several members in one room, and a
//! notification is fanned out to all of them.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use herald_core::types::Timestamp;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Outbound queue of one socket.
pub type WsSender = mpsc::UnboundedSender<Message>;

struct Member {
    sender: WsSender,
    joined_at: Timestamp,
}

/// A socket's seat in a room, returned by [`WsManager::join`].
pub struct Membership {
    pub conn_id: Uuid,
    /// Frames addressed to this socket; drained by the socket's write loop.
    pub outbound: mpsc::UnboundedReceiver<Message>,
}

/// Username to the sockets currently open for that user.
#[derive(Default)]
pub struct WsManager {
    rooms: RwLock<HashMap<String, HashMap<Uuid, Member>>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join(&self, username: &str) -> Membership {
        let (sender, outbound) = mpsc::unbounded_channel();
        let conn_id = Uuid::new_v4();
        self.rooms
            .write()
            .await
            .entry(username.to_string())
            .or_default()
            .insert(
                conn_id,
                Member {
                    sender,
                    joined_at: chrono::Utc::now(),
                },
            );
        Membership { conn_id, outbound }
    }

    /// Drop a socket from its room; empty rooms are removed.
    pub async fn leave(&self, username: &str, conn_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(username) else {
            return;
        };
        if let Some(member) = room.remove(&conn_id) {
            tracing::debug!(
                user = %username,
                conn_id = %conn_id,
                connected_secs = (chrono::Utc::now() - member.joined_at).num_seconds(),
                "Left push room"
            );
        }
        if room.is_empty() {
            rooms.remove(username);
        }
    }

    pub async fn members_of(&self, username: &str) -> usize {
        self.rooms.read().await.get(username).map_or(0, HashMap::len)
    }

    /// Queue `message` for every socket in `username`'s room.
    ///
    /// Returns how many sockets accepted it. A socket whose write loop has
    /// already ended is skipped; it leaves the room on its own.
    pub async fn send_to_user(&self, username: &str, message: Message) -> usize {
        let rooms = self.rooms.read().await;
        let Some(room) = rooms.get(username) else {
            return 0;
        };
        room.values()
            .filter(|member| member.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Open sockets across all rooms.
    pub async fn connection_count(&self) -> usize {
        self.rooms.read().await.values().map(HashMap::len).sum()
    }

    /// Send a Close frame to every socket and empty all rooms.
    pub async fn shutdown_all(&self) {
        let mut rooms = self.rooms.write().await;
        let mut count = 0usize;
        for member in rooms.values().flat_map(HashMap::values) {
            let _ = member.sender.send(Message::Close(None));
            count += 1;
        }
        rooms.clear();
        tracing::info!(count, "Closed all push connections");
    }

    pub async fn ping_all(&self) {
        let rooms = self.rooms.read().await;
        for member in rooms.values().flat_map(HashMap::values) {
            let _ = member.sender.send(Message::Ping(Bytes::new()));
        }
    }
}
