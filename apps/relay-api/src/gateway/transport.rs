//! Push transport capability: deliver a payload to one named connection.

use std::sync::Arc;

use async_trait::async_trait;

/// Result of a single push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    /// The recipient is permanently gone; its registry entry should be evicted.
    Stale,
    /// Any other failure. The recipient may still be reachable.
    Failed(String),
}

/// Delivers payloads to connections reachable through one endpoint.
#[async_trait]
pub trait PushClient: Send + Sync {
    async fn push(&self, connection_id: &str, payload: &str) -> PushOutcome;
}

/// Maps an origin endpoint to a push client.
///
/// Built once at startup and shared across requests; tests swap in a double.
pub trait TransportProvider: Send + Sync {
    fn client(&self, endpoint: &str) -> Arc<dyn PushClient>;
}
