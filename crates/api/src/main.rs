use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use herald_api::config::ServerConfig;
use herald_api::notifications::PushRelay;
use herald_api::router::build_app_router;
use herald_api::state::AppState;
use herald_api::ws::{self, WsManager};
use herald_events::{
    DigestScheduler, NotificationHub, NotificationService, PgSummaryStore, SummaryAggregator,
};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long background services get to finish after the server stops.
const SERVICE_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "herald_api=debug,herald_events=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        checkpoint_policy = %config.checkpoint_policy,
        digest_check_interval_secs = config.digest_check_interval_secs,
        "Loaded server configuration"
    );

    // --- Store ---
    let pool = herald_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    herald_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    herald_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- Engine ---
    let hub = Arc::new(NotificationHub::default());
    let notifications = NotificationService::new(pool.clone(), Arc::clone(&hub));
    let aggregator = SummaryAggregator::new(
        Arc::new(PgSummaryStore::new(pool.clone())),
        config.checkpoint_policy,
    );
    let ws_manager = Arc::new(WsManager::new());

    // --- Background services ---
    let cancel = CancellationToken::new();
    let services = TaskTracker::new();

    services.spawn(ws::run_heartbeat(Arc::clone(&ws_manager), cancel.clone()));
    services.spawn(PushRelay::new(Arc::clone(&ws_manager)).run(hub.subscribe(), cancel.clone()));

    let scheduler = DigestScheduler::new(pool.clone(), aggregator.clone(), notifications.clone())
        .with_interval(Duration::from_secs(config.digest_check_interval_secs));
    let scheduler_cancel = cancel.clone();
    services.spawn(async move { scheduler.run(scheduler_cancel).await });
    services.close();
    tracing::info!(count = services.len(), "Background services started");

    // --- HTTP ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        notifications,
        aggregator,
    };
    let app = build_app_router(state, &config);

    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Shutdown ---
    cancel.cancel();
    if tokio::time::timeout(SERVICE_SHUTDOWN_GRACE, services.wait())
        .await
        .is_err()
    {
        tracing::warn!("Background services did not stop in time");
    }
    ws_manager.shutdown_all().await;
    tracing::info!("Shutdown complete");
}

/// Resolve on SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!(signal = "SIGINT", "Shutting down"),
        () = terminate => tracing::info!(signal = "SIGTERM", "Shutting down"),
    }
}
