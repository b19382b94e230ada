pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod routes;

use std::sync::Arc;

use config::Config;
use db::store::ConnectionStore;
use gateway::fanout::BroadcastCoordinator;
use gateway::registry::ConnectionRegistry;
use gateway::session::{LocalTransport, SessionTable};
use gateway::transport::TransportProvider;

/// Shared application state available to all route handlers.
///
/// Built once at startup; every handle inside is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub registry: ConnectionRegistry,
    pub coordinator: BroadcastCoordinator,
    pub transports: Arc<dyn TransportProvider>,
    /// Live WebSocket sessions owned by this process.
    pub sessions: Arc<SessionTable>,
    pub config: Arc<Config>,
}

impl AppState {
    /// State with an explicit transport provider and a fresh session table.
    pub fn new(
        config: Config,
        store: Arc<dyn ConnectionStore>,
        transports: Arc<dyn TransportProvider>,
    ) -> Self {
        Self::with_sessions(config, store, Arc::new(SessionTable::new()), transports)
    }

    /// State whose pushes go to this process's own gateway sessions.
    pub fn local(config: Config, store: Arc<dyn ConnectionStore>) -> Self {
        let sessions = Arc::new(SessionTable::new());
        let transports = Arc::new(LocalTransport::new(sessions.clone()));
        Self::with_sessions(config, store, sessions, transports)
    }

    pub fn with_sessions(
        config: Config,
        store: Arc<dyn ConnectionStore>,
        sessions: Arc<SessionTable>,
        transports: Arc<dyn TransportProvider>,
    ) -> Self {
        let registry = ConnectionRegistry::new(store);
        let coordinator = BroadcastCoordinator::new(registry.clone(), config.broadcast_concurrency);
        Self {
            registry,
            coordinator,
            transports,
            sessions,
            config: Arc::new(config),
        }
    }
}
