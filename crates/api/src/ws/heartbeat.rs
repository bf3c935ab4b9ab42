use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::ws::manager::WsManager;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Ping every open push socket until `cancel` fires, so idle proxies keep
/// the connections alive.
pub async fn run_heartbeat(ws_manager: Arc<WsManager>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let count = ws_manager.connection_count().await;
                tracing::trace!(count, "Push heartbeat");
                ws_manager.ping_all().await;
            }
        }
    }
}
