//! Publish envelope format.
//!
//! Clients publish with a JSON object such as
//! `{"message": "sendmessage", "data": "What are you doing?"}`.
//! `message` names the route and is not interpreted here; `data` is the payload
//! pushed to every connection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::PublishError;

/// Inbound publish envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Envelope {
    /// Route name, e.g. `sendmessage`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload broadcast to every connection.
    pub data: String,
}

/// Extract the broadcast payload from a raw envelope body.
pub fn parse_payload(body: &str) -> Result<String, PublishError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| PublishError::InvalidEnvelope(e.to_string()))?;

    let Value::Object(mut fields) = value else {
        return Err(PublishError::InvalidEnvelope("expected an object".to_string()));
    };

    match fields.remove("data") {
        Some(Value::String(data)) => Ok(data),
        _ => Err(PublishError::MissingData),
    }
}
