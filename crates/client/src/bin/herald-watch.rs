//! Follow a user's notification inbox from the terminal.
//!
//! Starts a [`DeliveryController`] for the configured user and logs every
//! inbox change until Ctrl-C.

use std::sync::Arc;

use herald_client::{
    ClientConfig, DeliveryController, HttpNotificationApi, NotificationSession, WsPushChannel,
};
use herald_core::preferences::NotificationPreferences;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald_client=debug,herald_watch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ClientConfig::from_env();
    tracing::info!(api_url = %config.api_url, user = %config.username, "Loaded client configuration");

    let api = Arc::new(HttpNotificationApi::new(&config.api_url, &config.token));
    let push = Arc::new(WsPushChannel::new(&config.ws_url, &config.token));
    let session = NotificationSession::new(&config.username, NotificationPreferences::default());
    let controller = DeliveryController::new(session, api, push, config.poll);

    controller.start().await?;

    let mut changes = controller.watch();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = changes.borrow_and_update().clone();
                tracing::info!(
                    visible = snapshot.visible.len(),
                    unread = snapshot.unread_count,
                    has_unread_summary = snapshot.has_unread_summary,
                    "Inbox updated"
                );
                if let Some(popup) = &snapshot.popup {
                    tracing::info!(
                        notification_id = popup.notification.id,
                        title = %popup.notification.title,
                        message = %popup.notification.message,
                        "Pop-up"
                    );
                }
            }
        }
    }

    tracing::info!("Shutting down");
    controller.stop().await;
    Ok(())
}
