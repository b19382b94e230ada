/// Which transport provider the server wires into the event handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    /// Deliver through the in-process WebSocket session table.
    Local,
    /// Deliver through `POST {endpoint}/@connections/{id}`.
    Http,
}

/// Relay API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Redis connection string. When unset the registry lives in memory.
    pub redis_url: Option<String>,
    /// Redis set key holding the registered connection ids.
    pub connections_key: String,
    /// Origin endpoint used for publishes arriving over the gateway, and for
    /// HTTP publishes that do not name an allowed endpoint.
    pub public_endpoint: String,
    /// Endpoints a publisher may select with `X-Relay-Endpoint`. Compared
    /// without trailing slashes.
    pub allowed_endpoints: Vec<String>,
    pub push_mode: PushMode,
    /// Per-request timeout for HTTP pushes, in milliseconds.
    pub push_timeout_ms: u64,
    /// Maximum number of in-flight pushes per broadcast.
    pub broadcast_concurrency: usize,
    /// Capacity of each gateway session's outbound channel.
    pub session_buffer: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if `PUSH_MODE` holds an unknown value.
    pub fn from_env() -> Self {
        let port = parsed_var("PORT").unwrap_or(4010);
        Self {
            port,
            redis_url: optional_var("REDIS_URL"),
            connections_key: optional_var("CONNECTIONS_KEY")
                .unwrap_or_else(|| "relay:connections".to_string()),
            public_endpoint: optional_var("PUBLIC_ENDPOINT")
                .unwrap_or_else(|| format!("http://localhost:{port}")),
            allowed_endpoints: optional_var("ALLOWED_ENDPOINTS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(|s| s.trim_end_matches('/').to_string())
                        .collect()
                })
                .unwrap_or_default(),
            push_mode: match optional_var("PUSH_MODE").as_deref() {
                None | Some("local") => PushMode::Local,
                Some("http") => PushMode::Http,
                Some(other) => panic!("PUSH_MODE must be `local` or `http`, got `{other}`"),
            },
            push_timeout_ms: parsed_var("PUSH_TIMEOUT_MS").unwrap_or(5000),
            broadcast_concurrency: parsed_var("BROADCAST_CONCURRENCY")
                .unwrap_or(32usize)
                .max(1),
            session_buffer: parsed_var("SESSION_BUFFER").unwrap_or(64usize).max(1),
        }
    }

    /// Defaults suitable for tests: in-memory store, local transport.
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            redis_url: None,
            connections_key: "relay:connections:test".to_string(),
            public_endpoint: "http://localhost".to_string(),
            allowed_endpoints: Vec::new(),
            push_mode: PushMode::Local,
            push_timeout_ms: 2000,
            broadcast_concurrency: 8,
            session_buffer: 16,
        }
    }
}

impl Config {
    /// The endpoint a publish should push through: `requested` when it is on
    /// the allowlist, otherwise the public endpoint.
    pub fn origin_endpoint<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested {
            Some(endpoint)
                if self
                    .allowed_endpoints
                    .iter()
                    .any(|allowed| allowed == endpoint.trim_end_matches('/')) =>
            {
                endpoint
            }
            Some(endpoint) => {
                tracing::warn!(%endpoint, "ignoring endpoint that is not allowed");
                &self.public_endpoint
            }
            None => &self.public_endpoint,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    optional_var(name).and_then(|v| v.parse().ok())
}
