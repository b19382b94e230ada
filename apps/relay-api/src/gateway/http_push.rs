//! HTTP push transport: `POST {endpoint}/@connections/{id}`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::transport::{PushClient, PushOutcome, TransportProvider};

/// Builds one [`HttpPushClient`] per origin endpoint, all sharing a single
/// connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl TransportProvider for HttpTransport {
    fn client(&self, endpoint: &str) -> Arc<dyn PushClient> {
        Arc::new(HttpPushClient {
            client: self.client.clone(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

/// Pushes through one endpoint's connection management API.
pub struct HttpPushClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPushClient {
    /// `{endpoint}/@connections/{id}` with the id percent-encoded as a single
    /// path segment.
    fn connection_url(&self, connection_id: &str) -> Result<reqwest::Url, String> {
        let mut url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| format!("invalid endpoint `{}`: {e}", self.endpoint))?;
        url.path_segments_mut()
            .map_err(|()| format!("endpoint `{}` cannot carry a path", self.endpoint))?
            .pop_if_empty()
            .push("@connections")
            .push(connection_id);
        Ok(url)
    }
}

#[async_trait]
impl PushClient for HttpPushClient {
    async fn push(&self, connection_id: &str, payload: &str) -> PushOutcome {
        let url = match self.connection_url(connection_id) {
            Ok(url) => url,
            Err(detail) => return PushOutcome::Failed(detail),
        };
        let resp = match self.client.post(url).body(payload.to_string()).send().await {
            Ok(resp) => resp,
            Err(e) => return PushOutcome::Failed(e.to_string()),
        };

        match resp.status() {
            s if s.is_success() => PushOutcome::Delivered,
            StatusCode::GONE => PushOutcome::Stale,
            s => PushOutcome::Failed(format!("management endpoint returned {s}")),
        }
    }
}
