//! Push delivery.
//!
//! The [`PushRelay`] subscribes to the notification hub and forwards each
//! stored notification to its recipient's WebSocket room.

pub mod relay;

pub use relay::{push_frame, PushRelay};
