//! Client-side Delivery Controller for herald notifications.
//!
//! Keeps one user's inbox in sync with the notification store over HTTP,
//! a WebSocket push channel and a reconciliation poll, and decides what is
//! shown, suppressed or popped up.

pub mod api;
pub mod config;
pub mod controller;
pub mod push;
pub mod session;
pub mod view;

pub use api::{ClientError, HttpNotificationApi, NotificationApi, PreferencesUpdate};
pub use config::{ClientConfig, PollConfig};
pub use controller::{ControllerState, DeliveryController};
pub use push::{PushChannel, ReconnectConfig, WsPushChannel};
pub use session::{InboxSnapshot, NotificationSession, SuppressionSet};
pub use view::{Route, ViewContext};
