//! Connection lifecycle endpoints for transports that live outside this process.

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiErrorBody};
use crate::gateway::handler::{self, HandlerResponse};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/connections", get(list_connections))
        .route(
            "/connections/{connection_id}",
            put(attach_connection).delete(detach_connection),
        )
}

// ---------------------------------------------------------------------------
// PUT /connections/{connection_id}
// ---------------------------------------------------------------------------

#[utoipa::path(
    put,
    path = "/connections/{connection_id}",
    tag = "Connections",
    params(("connection_id" = String, Path, description = "Connection ID")),
    responses(
        (status = 200, description = "Connected.", body = String, content_type = "text/plain"),
        (status = 500, description = "Failed to connect: {detail}", body = String, content_type = "text/plain"),
    ),
)]
pub async fn attach_connection(
    State(state): State<AppState>,
    Path(connection_id): Path<String>,
) -> HandlerResponse {
    handler::on_attach(&state, &connection_id).await
}

// ---------------------------------------------------------------------------
// DELETE /connections/{connection_id}
// ---------------------------------------------------------------------------

#[utoipa::path(
    delete,
    path = "/connections/{connection_id}",
    tag = "Connections",
    params(("connection_id" = String, Path, description = "Connection ID")),
    responses(
        (status = 200, description = "Disconnected.", body = String, content_type = "text/plain"),
        (status = 500, description = "Failed to disconnect: {detail}", body = String, content_type = "text/plain"),
    ),
)]
pub async fn detach_connection(
    State(state): State<AppState>,
    Path(connection_id): Path<String>,
) -> HandlerResponse {
    handler::on_detach(&state, &connection_id).await
}

// ---------------------------------------------------------------------------
// GET /connections
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct ListConnectionsResponse {
    pub data: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/connections",
    tag = "Connections",
    responses(
        (status = 200, description = "Registered connection ids", body = ListConnectionsResponse),
        (status = 500, description = "Store unavailable", body = ApiErrorBody),
    ),
)]
pub async fn list_connections(
    State(state): State<AppState>,
) -> Result<Json<ListConnectionsResponse>, ApiError> {
    let data = state.registry.list().await?;
    Ok(Json(ListConnectionsResponse { data }))
}
