//! WebSocket upgrade handler, per-connection event loop, and the connection
//! management push endpoint.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use relay_common::{ConnectionId, PrefixedId};
use tokio::sync::{mpsc, Semaphore};

use crate::error::{ApiError, ApiErrorBody};
use crate::AppState;

use super::handler;
use super::transport::PushOutcome;

/// Close code sent when the connection cannot be registered.
const CLOSE_INTERNAL_ERROR: u16 = 1011;

/// Broadcasts one session may have running at once. Further publishes wait.
const PUBLISHES_PER_SESSION: usize = 4;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/gateway", get(ws_upgrade))
        .route("/@connections/{connection_id}", post(push_to_connection))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, ws_rx) = socket.split();
    let connection_id = ConnectionId::generate();

    // Open the outbound channel first so a broadcast that snapshots this id
    // right after attach can already reach it.
    let outbound = state
        .sessions
        .open(&connection_id, state.config.session_buffer);

    let attached = handler::on_attach(&state, &connection_id).await;
    if !attached.is_success() {
        state.sessions.close(&connection_id);
        let _ = send_close(&mut ws_tx, CLOSE_INTERNAL_ERROR, "Failed to connect").await;
        return;
    }

    run_session(&state, &connection_id, ws_tx, ws_rx, outbound).await;

    state.sessions.close(&connection_id);
    let detached = handler::on_detach(&state, &connection_id).await;

    tracing::info!(
        connection_id = %connection_id,
        status = %detached.status,
        "gateway session ended"
    );
}

/// Main session loop: publish inbound text frames, forward queued pushes.
///
/// Publishes run as their own tasks so the loop keeps draining `outbound`
/// while a broadcast is in flight, including pushes to this same session.
async fn run_session(
    state: &AppState,
    connection_id: &str,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut ws_rx: SplitStream<WebSocket>,
    mut outbound: mpsc::Receiver<String>,
) {
    let publishes = Arc::new(Semaphore::new(PUBLISHES_PER_SESSION));
    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let envelope = text.as_str().to_owned();
                        spawn_publish(state, connection_id, &publishes, envelope);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(?e, connection_id = %connection_id, "ws read error");
                        break;
                    }
                    // Pings are answered by axum; binary frames carry no envelope.
                    Some(Ok(_)) => continue,
                }
            }

            payload = outbound.recv() => {
                let Some(payload) = payload else { break };
                if ws_tx.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
        }
    }
}

fn spawn_publish(
    state: &AppState,
    connection_id: &str,
    publishes: &Arc<Semaphore>,
    envelope: String,
) {
    let state = state.clone();
    let connection_id = connection_id.to_string();
    let publishes = publishes.clone();
    tokio::spawn(async move {
        let Ok(_permit) = publishes.acquire_owned().await else {
            return;
        };
        let resp =
            handler::on_publish(&state, &envelope, &state.config.public_endpoint).await;
        tracing::debug!(
            connection_id = %connection_id,
            status = %resp.status,
            body = %resp.body,
            "publish handled"
        );
    });
}

/// Send a WebSocket close frame with a code and reason.
async fn send_close(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    code: u16,
    reason: &str,
) -> Result<(), axum::Error> {
    let close_msg = Message::Close(Some(CloseFrame {
        code,
        reason: reason.to_string().into(),
    }));
    ws_tx.send(close_msg).await
}

// ---------------------------------------------------------------------------
// POST /@connections/{connection_id}
// ---------------------------------------------------------------------------

/// Push a raw payload to one connection attached to this process.
#[utoipa::path(
    post,
    path = "/@connections/{connection_id}",
    tag = "Gateway",
    params(
        ("connection_id" = String, Path, description = "Connection ID"),
    ),
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 200, description = "Payload queued on the connection"),
        (status = 410, description = "Connection is gone", body = ApiErrorBody),
        (status = 503, description = "Connection cannot accept the payload right now", body = ApiErrorBody),
    ),
)]
pub async fn push_to_connection(
    State(state): State<AppState>,
    Path(connection_id): Path<String>,
    body: String,
) -> Result<StatusCode, ApiError> {
    match state.sessions.deliver(&connection_id, &body) {
        PushOutcome::Delivered => Ok(StatusCode::OK),
        PushOutcome::Stale => Err(ApiError::gone("Connection is gone")),
        PushOutcome::Failed(detail) => Err(ApiError::unavailable(detail)),
    }
}
