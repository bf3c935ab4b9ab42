use std::sync::Arc;

use herald_db::DbPool;
use herald_events::{NotificationService, SummaryAggregator};

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Handler state. Every field is a handle, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<ServerConfig>,
    /// Push rooms, also fed by the relay task.
    pub ws_manager: Arc<WsManager>,
    /// Store-then-publish entry point for event producers.
    pub notifications: NotificationService,
    /// Shared with the digest scheduler so both honour one run guard.
    pub aggregator: SummaryAggregator,
}
