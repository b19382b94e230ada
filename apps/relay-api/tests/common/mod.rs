#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use futures_util::StreamExt;
use tokio::time;

use relay_api::config::Config;
use relay_api::db::store::{ConnectionStore, MemoryStore};
use relay_api::error::StoreError;
use relay_api::AppState;

pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Store that refuses every operation, standing in for an unreachable backend.
pub struct DownStore;

#[async_trait]
impl ConnectionStore for DownStore {
    async fn put(&self, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn delete(&self, _id: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn scan_all(&self) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Build a test AppState with an in-memory store and the local transport.
pub fn test_state() -> AppState {
    AppState::local(Config::for_tests(), Arc::new(MemoryStore::new()))
}

/// Build the full application router wired to the test state.
pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    let app = relay_api::routes::router().with_state(state.clone());
    (app, state)
}

/// Bind an ephemeral port, so a config can name the address before serving.
pub async fn bind() -> (tokio::net::TcpListener, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Serve `state` on `listener` in the background.
pub fn serve(listener: tokio::net::TcpListener, state: AppState) {
    let app = relay_api::routes::router().with_state(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
}

/// Serve `state` on an ephemeral port. The server runs in the background.
pub async fn start_server(state: AppState) -> SocketAddr {
    let (listener, addr) = bind().await;
    serve(listener, state);
    addr
}

/// Open a WebSocket to the gateway.
pub async fn connect(addr: SocketAddr) -> WsStream {
    let url = format!("ws://{addr}/gateway");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws
}

/// Poll the registry until it holds exactly `n` ids.
pub async fn wait_for_connections(state: &AppState, n: usize) -> Vec<String> {
    time::timeout(Duration::from_secs(5), async {
        loop {
            let ids = state.registry.list().await.expect("list");
            if ids.len() == n {
                return ids;
            }
            time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {n} registered connections"))
}

/// Read the next text frame.
pub async fn next_text(ws: &mut WsStream) -> String {
    next_text_within(ws, Duration::from_secs(5)).await
}

/// Read the next text frame, failing if none arrives within `limit`.
pub async fn next_text_within(ws: &mut WsStream, limit: Duration) -> String {
    let msg = time::timeout(limit, ws.next())
        .await
        .expect("timeout waiting for message")
        .expect("stream ended")
        .expect("ws read error");
    msg.into_text().expect("not text").to_string()
}

/// Assert no frame arrives within a short window.
pub async fn assert_silent(ws: &mut WsStream) {
    let res = time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(res.is_err(), "expected no message, got {res:?}");
}
