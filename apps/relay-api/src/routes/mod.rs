pub mod connections;
pub mod health;
pub mod messages;

use axum::Router;
use utoipa::OpenApi;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crate::gateway::server::router())
        .merge(connections::router())
        .merge(messages::router())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health,
        // Connections
        connections::attach_connection,
        connections::detach_connection,
        connections::list_connections,
        // Messages
        messages::publish_message,
        // Gateway
        crate::gateway::server::push_to_connection,
    ),
    components(
        schemas(
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::gateway::events::Envelope,
            health::HealthResponse,
            connections::ListConnectionsResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Connections", description = "Connection lifecycle"),
        (name = "Messages", description = "Broadcast publishing"),
        (name = "Gateway", description = "Connection management API"),
    )
)]
pub struct ApiDoc;
