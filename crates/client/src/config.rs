use std::time::Duration;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the takeoff server, without the `/api/forge` prefix.
    pub server_url: String,
    /// WebSocket endpoint for job notifications.
    pub ws_url: String,
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                              |
    /// |-------------------------------|--------------------------------------|
    /// | `TAKEOFF_SERVER_URL`          | `http://localhost:3000`              |
    /// | `TAKEOFF_WS_URL`              | derived from `TAKEOFF_SERVER_URL`    |
    /// | `TAKEOFF_REQUEST_TIMEOUT_SECS`| `60`                                 |
    pub fn from_env() -> Self {
        let server_url = std::env::var("TAKEOFF_SERVER_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into());
        let ws_url = std::env::var("TAKEOFF_WS_URL").ok();

        let request_timeout_secs: u64 = std::env::var("TAKEOFF_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("TAKEOFF_REQUEST_TIMEOUT_SECS must be a valid u64");

        Self::new(server_url, ws_url, Duration::from_secs(request_timeout_secs))
    }

    /// Build a config; without an explicit `ws_url` the notification
    /// endpoint is derived from `server_url`.
    pub fn new(server_url: impl Into<String>, ws_url: Option<String>, request_timeout: Duration) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        let ws_url = ws_url.unwrap_or_else(|| derive_ws_url(&server_url));
        Self {
            server_url,
            ws_url,
            request_timeout,
        }
    }
}

/// `http://host` becomes `ws://host/api/forge/ws`, `https` becomes `wss`.
pub fn derive_ws_url(server_url: &str) -> String {
    let base = server_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{ws_base}/api/forge/ws")
}
