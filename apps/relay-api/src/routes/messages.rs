//! Publish endpoint.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::Router;

use crate::gateway::events::Envelope;
use crate::gateway::handler::{self, HandlerResponse};
use crate::AppState;

/// Header naming the management endpoint pushes should go through.
pub const ENDPOINT_HEADER: &str = "x-relay-endpoint";

pub fn router() -> Router<AppState> {
    Router::new().route("/messages", post(publish_message))
}

// ---------------------------------------------------------------------------
// POST /messages
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/messages",
    tag = "Messages",
    params(
        ("x-relay-endpoint" = Option<String>, Header, description = "Origin endpoint; honoured only when listed in ALLOWED_ENDPOINTS, otherwise PUBLIC_ENDPOINT"),
    ),
    request_body = Envelope,
    responses(
        (status = 200, description = "Data sent to N connection(s)", body = String, content_type = "text/plain"),
        (status = 400, description = "Envelope has no `data` field"),
        (status = 500, description = "Failed to send message: {detail}", body = String, content_type = "text/plain"),
    ),
)]
pub async fn publish_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> HandlerResponse {
    let requested = headers
        .get(ENDPOINT_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());
    let endpoint = state.config.origin_endpoint(requested);

    handler::on_publish(&state, &body, endpoint).await
}
