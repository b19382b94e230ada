//! In-process table of live gateway sessions and the local push transport.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::transport::{PushClient, PushOutcome, TransportProvider};

/// Outbound channels of every WebSocket connected to this process, keyed by
/// connection id.
///
/// Uses `DashMap` for shard-level concurrency; a push never waits on another
/// session's socket.
#[derive(Default)]
pub struct SessionTable {
    sessions: DashMap<String, mpsc::Sender<String>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an outbound channel for `connection_id`. The gateway drains the
    /// returned receiver into the socket.
    pub fn open(&self, connection_id: &str, capacity: usize) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(capacity);
        self.sessions.insert(connection_id.to_string(), tx);
        rx
    }

    /// Drop the session. Subsequent pushes to it report `Stale`.
    pub fn close(&self, connection_id: &str) {
        self.sessions.remove(connection_id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Queue `payload` on the session's channel without waiting.
    pub fn deliver(&self, connection_id: &str, payload: &str) -> PushOutcome {
        let Some(tx) = self.sessions.get(connection_id) else {
            return PushOutcome::Stale;
        };
        match tx.try_send(payload.to_string()) {
            Ok(()) => PushOutcome::Delivered,
            Err(TrySendError::Full(_)) => PushOutcome::Failed("outbound buffer full".to_string()),
            Err(TrySendError::Closed(_)) => PushOutcome::Stale,
        }
    }
}

#[async_trait]
impl PushClient for SessionTable {
    async fn push(&self, connection_id: &str, payload: &str) -> PushOutcome {
        self.deliver(connection_id, payload)
    }
}

/// Provider that ignores the endpoint and pushes into this process's sessions.
#[derive(Clone)]
pub struct LocalTransport {
    sessions: Arc<SessionTable>,
}

impl LocalTransport {
    pub fn new(sessions: Arc<SessionTable>) -> Self {
        Self { sessions }
    }
}

impl TransportProvider for LocalTransport {
    fn client(&self, _endpoint: &str) -> Arc<dyn PushClient> {
        self.sessions.clone()
    }
}
