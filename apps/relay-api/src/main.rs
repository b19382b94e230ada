use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_api::config::{Config, PushMode};
use relay_api::db::redis_store::RedisStore;
use relay_api::db::store::{ConnectionStore, MemoryStore};
use relay_api::gateway::http_push::HttpTransport;
use relay_api::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing — env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    let store: Arc<dyn ConnectionStore> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisStore::connect(url, config.connections_key.clone())
                .await
                .expect("failed to connect to redis"),
        ),
        None => {
            tracing::warn!("REDIS_URL not set; connections are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    tracing::info!(
        public_endpoint = %config.public_endpoint,
        push_mode = ?config.push_mode,
        broadcast_concurrency = config.broadcast_concurrency,
        "relay-api configured"
    );

    let push_mode = config.push_mode;
    let state = match push_mode {
        PushMode::Local => AppState::local(config, store),
        PushMode::Http => {
            let transport = HttpTransport::new(Duration::from_millis(config.push_timeout_ms))
                .expect("failed to build http client");
            AppState::new(config, store, Arc::new(transport))
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(relay_api::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "relay-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(?e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
