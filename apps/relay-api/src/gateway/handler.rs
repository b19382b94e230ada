//! Event handlers: attach, publish, detach.
//!
//! Each handler maps one inbound event onto the registry or the coordinator and
//! always yields a status/body pair. Errors never escape a handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::events::parse_payload;
use crate::AppState;

/// Plain-text status/body pair returned by every event handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HandlerResponse {
    fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
        }
    }

    fn internal(body: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        (self.status, self.body).into_response()
    }
}

/// Register a newly attached connection.
pub async fn on_attach(state: &AppState, connection_id: &str) -> HandlerResponse {
    match state.registry.add(connection_id).await {
        Ok(()) => {
            tracing::info!(connection_id = %connection_id, "connection attached");
            HandlerResponse::ok("Connected.")
        }
        Err(err) => {
            tracing::error!(?err, connection_id = %connection_id, "error connecting");
            HandlerResponse::internal(format!("Failed to connect: {err}"))
        }
    }
}

/// Unregister a detached connection.
pub async fn on_detach(state: &AppState, connection_id: &str) -> HandlerResponse {
    match state.registry.remove(connection_id).await {
        Ok(()) => {
            tracing::info!(connection_id = %connection_id, "connection detached");
            HandlerResponse::ok("Disconnected.")
        }
        Err(err) => {
            tracing::error!(?err, connection_id = %connection_id, "error disconnecting");
            HandlerResponse::internal(format!("Failed to disconnect: {err}"))
        }
    }
}

/// Broadcast the envelope's `data` to every registered connection, pushing
/// through the client bound to `origin_endpoint`.
pub async fn on_publish(state: &AppState, envelope: &str, origin_endpoint: &str) -> HandlerResponse {
    let payload = match parse_payload(envelope) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::info!(%err, "rejected publish envelope");
            return HandlerResponse {
                status: StatusCode::BAD_REQUEST,
                body: String::new(),
            };
        }
    };

    tracing::debug!(endpoint = %origin_endpoint, "publishing through management endpoint");
    let client = state.transports.client(origin_endpoint);
    match state.coordinator.broadcast(client.as_ref(), &payload).await {
        Ok(result) => HandlerResponse::ok(delivered_message(result.delivered)),
        Err(err) => {
            tracing::error!(?err, "error sending message");
            HandlerResponse::internal(format!("Failed to send message: {err}"))
        }
    }
}

/// Publisher-facing summary of a broadcast.
pub fn delivered_message(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("Data sent to {count} connection{plural}")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::config::Config;
    use crate::db::store::{ConnectionStore, MemoryStore};
    use crate::error::StoreError;
    use crate::gateway::transport::{PushClient, PushOutcome, TransportProvider};

    /// Records endpoints and pushes; `def456` is always gone.
    #[derive(Default)]
    struct RecordingTransport {
        endpoints: Mutex<Vec<String>>,
        pushes: Arc<Mutex<Vec<String>>>,
    }

    struct RecordingClient {
        pushes: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl PushClient for RecordingClient {
        async fn push(&self, connection_id: &str, _payload: &str) -> PushOutcome {
            self.pushes.lock().push(connection_id.to_string());
            if connection_id == "def456" {
                PushOutcome::Stale
            } else {
                PushOutcome::Delivered
            }
        }
    }

    impl TransportProvider for RecordingTransport {
        fn client(&self, endpoint: &str) -> Arc<dyn PushClient> {
            self.endpoints.lock().push(endpoint.to_string());
            Arc::new(RecordingClient {
                pushes: self.pushes.clone(),
            })
        }
    }

    /// Store that is always down.
    struct DownStore;

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

    fn state_with(store: Arc<dyn ConnectionStore>) -> (AppState, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let state = AppState::new(Config::for_tests(), store, transport.clone());
        (state, transport)
    }

    #[tokio::test]
    async fn attach_registers_connection() {
        let (state, _) = state_with(Arc::new(MemoryStore::new()));

        let resp = on_attach(&state, "abc123").await;

        assert_eq!(resp, HandlerResponse::ok("Connected."));
        assert_eq!(state.registry.list().await.unwrap(), vec!["abc123"]);
    }

    #[tokio::test]
    async fn detach_unregisters_connection() {
        let (state, _) = state_with(Arc::new(MemoryStore::new()));
        state.registry.add("abc123").await.unwrap();

        let resp = on_detach(&state, "abc123").await;

        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body, "Disconnected.");
        assert!(state.registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn publish_evicts_gone_connection() {
        let (state, transport) = state_with(Arc::new(MemoryStore::new()));
        state.registry.add("abc123").await.unwrap();
        state.registry.add("def456").await.unwrap();

        let resp = on_publish(
            &state,
            r#"{"message":"sendmessage","data":"hi"}"#,
            "https://example.com/prod",
        )
        .await;

        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body, "Data sent to 1 connection");
        assert_eq!(state.registry.list().await.unwrap(), vec!["abc123"]);
        assert_eq!(*transport.endpoints.lock(), vec!["https://example.com/prod"]);
    }

    #[tokio::test]
    async fn publish_without_data_is_rejected() {
        let (state, transport) = state_with(Arc::new(MemoryStore::new()));
        state.registry.add("abc123").await.unwrap();

        let resp = on_publish(&state, r#"{"message":"sendmessage"}"#, "https://example.com/prod").await;

        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert!(transport.pushes.lock().is_empty());
        assert!(transport.endpoints.lock().is_empty());
        assert_eq!(state.registry.list().await.unwrap(), vec!["abc123"]);
    }

    #[tokio::test]
    async fn store_failures_become_500s() {
        let (state, _) = state_with(Arc::new(DownStore));

        let resp = on_attach(&state, "abc123").await;
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.body.starts_with("Failed to connect: "));
        assert!(resp.body.contains("connection refused"));

        let resp = on_detach(&state, "abc123").await;
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.body.starts_with("Failed to disconnect: "));

        let resp = on_publish(&state, r#"{"data":"hi"}"#, "https://example.com/prod").await;
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.body.starts_with("Failed to send message: "));
        assert!(!resp.is_success());
    }

    /// In-memory sink for formatted log lines.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn lifecycle_is_logged_only_once_stored() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (down, _) = state_with(Arc::new(DownStore));
        on_attach(&down, "abc123").await;
        on_detach(&down, "abc123").await;
        let failed = logs.contents();
        assert!(failed.contains("error connecting"));
        assert!(!failed.contains("connection attached"));
        assert!(!failed.contains("connection detached"));

        let (up, _) = state_with(Arc::new(MemoryStore::new()));
        on_attach(&up, "abc123").await;
        on_detach(&up, "abc123").await;
        let stored = logs.contents();
        assert!(stored.contains("connection attached"));
        assert!(stored.contains("connection detached"));
    }

    #[test]
    fn delivered_message_wording() {
        assert_eq!(delivered_message(0), "Data sent to 0 connections");
        assert_eq!(delivered_message(1), "Data sent to 1 connection");
        assert_eq!(delivered_message(2), "Data sent to 2 connections");
    }
}
