#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use herald_api::auth::jwt::{issue_token, JwtConfig};
use herald_api::config::ServerConfig;
use herald_api::router::build_app_router;
use herald_api::state::AppState;
use herald_api::ws::WsManager;
use herald_core::checkpoint::CheckpointPolicy;
use herald_core::roles::{ROLE_PRODUCER, ROLE_USER};
use herald_db::models::user::{CreateUser, UpdatePreferences};
use herald_db::repositories::UserRepo;
use herald_events::{NotificationHub, NotificationService, PgSummaryStore, SummaryAggregator};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: String::new(),
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        digest_check_interval_secs: 60,
        checkpoint_policy: CheckpointPolicy::WidenToLastLogin,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            token_ttl_mins: 15,
        },
    }
}

/// Build the application router with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_hub(pool, Arc::new(NotificationHub::default()))
}

/// Like [`build_test_app`], but publishing to the given hub so tests can
/// observe pushes.
pub fn build_test_app_with_hub(pool: PgPool, hub: Arc<NotificationHub>) -> Router {
    let config = test_config();
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        ws_manager: Arc::new(WsManager::new()),
        notifications: NotificationService::new(pool.clone(), hub),
        aggregator: SummaryAggregator::new(
            Arc::new(PgSummaryStore::new(pool)),
            config.checkpoint_policy,
        ),
    };
    build_app_router(state, &config)
}

/// Bearer token for an ordinary user, signed with the test secret.
pub fn token_for(username: &str) -> String {
    issue_token(username, ROLE_USER, &test_config().jwt).expect("token generation should succeed")
}

/// Bearer token for an event producer.
pub fn producer_token(service: &str) -> String {
    issue_token(service, ROLE_PRODUCER, &test_config().jwt)
        .expect("token generation should succeed")
}

/// Create a user with default preferences.
pub async fn create_user(pool: &PgPool, username: &str) {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            display_name: None,
        },
    )
    .await
    .expect("user creation should succeed");
}

/// Create a user who receives a daily digest.
pub async fn create_digest_user(pool: &PgPool, username: &str) {
    create_user(pool, username).await;
    UserRepo::update_preferences(
        pool,
        username,
        &UpdatePreferences {
            summarized: Some(true),
            ..Default::default()
        },
    )
    .await
    .expect("preference update should succeed");
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
