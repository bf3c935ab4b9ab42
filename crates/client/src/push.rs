//! Server-to-client push channel.
//!
//! [`PushChannel`] is best-effort: the controller treats a closed channel
//! as "polling only" and never relies on push for completeness.
//! [`WsPushChannel`] connects to the herald WebSocket endpoint and
//! reconnects with exponential backoff when the connection drops.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use herald_core::notification::Notification;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::api::ClientError;

/// Buffer between the socket reader and the controller.
const PUSH_BUFFER: usize = 256;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Join the user's room. Notifications arrive on the returned receiver
    /// until [`unsubscribe`](Self::unsubscribe) is called or the channel
    /// gives up; the receiver then yields `None`.
    async fn subscribe(
        &self,
        username: &str,
    ) -> Result<mpsc::Receiver<Notification>, ClientError>;

    async fn unsubscribe(&self, username: &str) -> Result<(), ClientError>;
}

// ---------------------------------------------------------------------------
// Reconnect backoff
// ---------------------------------------------------------------------------

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// The result is clamped to [`ReconnectConfig::max_delay`].
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Extract the notification from a `{"type":"notification","data":...}`
/// frame. Other frame types yield `None`.
pub fn parse_push_frame(text: &str) -> Option<Notification> {
    let mut frame: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring non-JSON push frame");
            return None;
        }
    };
    if frame.get("type").and_then(|t| t.as_str()) != Some("notification") {
        return None;
    }
    match serde_json::from_value(frame["data"].take()) {
        Ok(notification) => Some(notification),
        Err(e) => {
            tracing::warn!(error = %e, "Malformed notification push frame");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// WsPushChannel
// ---------------------------------------------------------------------------

/// WebSocket push channel authenticated with a bearer token.
pub struct WsPushChannel {
    ws_url: String,
    token: String,
    reconnect: ReconnectConfig,
    /// Reader task per subscribed user.
    subscriptions: Mutex<HashMap<String, CancellationToken>>,
}

impl WsPushChannel {
    /// * `ws_url` - push endpoint, e.g. `ws://host:3000/ws`.
    pub fn new(ws_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            token: token.into(),
            reconnect: ReconnectConfig::default(),
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    fn url(&self) -> String {
        format!("{}?token={}", self.ws_url, self.token)
    }
}

#[async_trait]
impl PushChannel for WsPushChannel {
    async fn subscribe(
        &self,
        username: &str,
    ) -> Result<mpsc::Receiver<Notification>, ClientError> {
        let url = self.url();
        let (stream, _response) = connect_async(&url).await.map_err(|e| {
            ClientError::Push(format!("Failed to connect to {}: {e}", self.ws_url))
        })?;
        tracing::info!(user = %username, "Push channel connected to {}", self.ws_url);

        let (tx, rx) = mpsc::channel(PUSH_BUFFER);
        let cancel = CancellationToken::new();
        let previous = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(username.to_string(), cancel.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        tokio::spawn(run_connection(
            url,
            stream,
            tx,
            cancel,
            self.reconnect,
            username.to_string(),
        ));
        Ok(rx)
    }

    async fn unsubscribe(&self, username: &str) -> Result<(), ClientError> {
        let removed = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(username);
        if let Some(cancel) = removed {
            cancel.cancel();
            tracing::info!(user = %username, "Push channel unsubscribed");
        }
        Ok(())
    }
}

/// Read frames, reconnecting on drop, until cancelled or the receiver is
/// gone.
async fn run_connection(
    url: String,
    mut stream: WsStream,
    tx: mpsc::Sender<Notification>,
    cancel: CancellationToken,
    reconnect: ReconnectConfig,
    username: String,
) {
    loop {
        read_frames(&mut stream, &tx, &cancel, &username).await;
        if cancel.is_cancelled() || tx.is_closed() {
            break;
        }
        match reconnect_loop(&url, &reconnect, &cancel, &username).await {
            Some(next) => stream = next,
            None => break,
        }
    }
    tracing::debug!(user = %username, "Push reader stopped");
}

async fn read_frames(
    stream: &mut WsStream,
    tx: &mpsc::Sender<Notification>,
    cancel: &CancellationToken,
    username: &str,
) {
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = stream.close(None).await;
                return;
            }
            msg = stream.next() => msg,
        };

        match msg {
            Some(Ok(Message::Text(text))) => {
                if let Some(notification) = parse_push_frame(&text) {
                    if tx.send(notification).await.is_err() {
                        return;
                    }
                }
            }
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(user = %username, ?frame, "Push channel closed by server");
                return;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::warn!(user = %username, error = %e, "Push channel receive error");
                return;
            }
            None => return,
        }
    }
}

/// Returns `None` if `cancel` fires before a connection succeeds.
async fn reconnect_loop(
    url: &str,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
    username: &str,
) -> Option<WsStream> {
    let mut delay = config.initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }

        match connect_async(url).await {
            Ok((stream, _)) => {
                tracing::info!(user = %username, attempt, "Push channel reconnected");
                return Some(stream);
            }
            Err(e) => {
                tracing::warn!(
                    user = %username,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Push reconnect failed",
                );
                delay = next_delay(delay, config);
            }
        }
    }
}
