use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use herald_db::repositories::UserRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::ws::manager::{Membership, WsManager};

/// Query parameters for `GET /ws`. Browsers cannot set headers on a
/// WebSocket handshake, so the access token travels in the query string.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// Authenticate, then upgrade the connection and join the user's room.
///
/// Opening the push channel counts as a login for digest checkpointing.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> AppResult<impl IntoResponse> {
    let token = params
        .token
        .ok_or_else(|| AppError::Unauthorized("Missing token query parameter".into()))?;
    let AuthUser { username, .. } = AuthUser::from_token(&token, &state)?;

    if let Err(e) = UserRepo::touch_last_login(&state.pool, &username, chrono::Utc::now()).await {
        tracing::warn!(user = %username, error = %e, "Failed to record login");
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, username)))
}

/// Pump frames for one socket until either side closes.
///
/// Outbound frames come from the room; inbound frames are only watched for
/// close and errors since the channel is one-way.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, username: String) {
    let Membership {
        conn_id,
        mut outbound,
    } = ws_manager.join(&username).await;
    tracing::info!(conn_id = %conn_id, user = %username, "Push channel opened");

    let (mut sink, mut inbound) = socket.split();
    loop {
        tokio::select! {
            frame = outbound.recv() => {
                // `None` once the manager has shut the room down.
                let Some(frame) = frame else { break };
                if let Err(e) = sink.send(frame).await {
                    tracing::debug!(conn_id = %conn_id, error = %e, "Push send failed");
                    break;
                }
            }
            frame = inbound.next() => match frame {
                None | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "Push receive error");
                    break;
                }
            },
        }
    }

    ws_manager.leave(&username, conn_id).await;
    tracing::info!(conn_id = %conn_id, user = %username, "Push channel closed");
}
