//! WebSocket push channel.
//!
//! Each authenticated connection joins its user's room;
//! [`WsManager::send_to_user`] addresses every connection in a room.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::run_heartbeat;
pub use manager::WsManager;
