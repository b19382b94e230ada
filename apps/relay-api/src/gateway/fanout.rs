//! Broadcast coordinator: fan one payload out to every registered connection.
//!
//! The recipient set is the registry snapshot taken when the broadcast starts.
//! Connections that attach while pushes are in flight are not included.
//! Pushes run with bounded parallelism and every recipient is attempted
//! regardless of how the others fare.

use futures_util::stream::{self, StreamExt};

use super::registry::ConnectionRegistry;
use super::transport::{PushClient, PushOutcome};
use crate::error::StoreError;

/// Tally for one broadcast. Only `delivered` is reported to the publisher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastResult {
    /// Size of the registry snapshot.
    pub recipients: usize,
    pub delivered: usize,
    /// Stale recipients removed from the registry.
    pub evicted: usize,
    /// Recipients that failed transiently, or were stale but could not be
    /// evicted. They stay registered.
    pub failed: usize,
}

enum Attempt {
    Delivered,
    Evicted,
    Failed,
}

/// Orchestrates delivery of a payload to every registered connection.
#[derive(Clone)]
pub struct BroadcastCoordinator {
    registry: ConnectionRegistry,
    concurrency: usize,
}

impl BroadcastCoordinator {
    /// `concurrency` caps the number of in-flight pushes; values below 1 are
    /// treated as 1.
    pub fn new(registry: ConnectionRegistry, concurrency: usize) -> Self {
        Self {
            registry,
            concurrency: concurrency.max(1),
        }
    }

    /// Push `payload` through `client` to every id in a fresh registry snapshot.
    ///
    /// Only a failure to take the snapshot is returned as an error; per-recipient
    /// failures are absorbed and reflected in the counts.
    pub async fn broadcast(
        &self,
        client: &dyn PushClient,
        payload: &str,
    ) -> Result<BroadcastResult, StoreError> {
        let recipients = self.registry.list().await?;
        let mut result = BroadcastResult {
            recipients: recipients.len(),
            ..BroadcastResult::default()
        };

        let registry = &self.registry;
        let mut attempts = stream::iter(recipients)
            .map(move |id| async move { attempt(registry, client, &id, payload).await })
            .buffer_unordered(self.concurrency);

        while let Some(outcome) = attempts.next().await {
            match outcome {
                Attempt::Delivered => result.delivered += 1,
                Attempt::Evicted => result.evicted += 1,
                Attempt::Failed => result.failed += 1,
            }
        }

        tracing::info!(
            recipients = result.recipients,
            delivered = result.delivered,
            evicted = result.evicted,
            failed = result.failed,
            "broadcast complete"
        );

        Ok(result)
    }
}

async fn attempt(
    registry: &ConnectionRegistry,
    client: &dyn PushClient,
    id: &str,
    payload: &str,
) -> Attempt {
    match client.push(id, payload).await {
        PushOutcome::Delivered => {
            tracing::debug!(connection_id = %id, "pushed to connection");
            Attempt::Delivered
        }
        PushOutcome::Stale => {
            tracing::info!(connection_id = %id, "evicting gone connection");
            match registry.remove(id).await {
                Ok(()) => Attempt::Evicted,
                Err(err) => {
                    tracing::warn!(?err, connection_id = %id, "failed to evict gone connection");
                    Attempt::Failed
                }
            }
        }
        PushOutcome::Failed(detail) => {
            tracing::warn!(connection_id = %id, %detail, "push to connection failed");
            Attempt::Failed
        }
    }
}
