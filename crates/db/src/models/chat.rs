//! Chat models read by the summary aggregator.

use herald_core::types::DbId;
use sqlx::FromRow;

/// One of a user's chats, seen from that user's side.
#[derive(Debug, Clone, FromRow)]
pub struct ChatPeer {
    pub chat_id: DbId,
    /// Username of the other participant.
    pub other_username: String,
    /// Display name of the other participant, falling back to the username.
    pub other_display_name: String,
    /// The other participant's account is soft-deleted.
    pub other_deleted: bool,
}
