use serde::Deserialize;
use takeoff_core::error::CoreError;

/// Errors from calls to the takeoff server.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Server error ({status}, {code}): {message}")]
    Server {
        status: u16,
        /// Machine-readable code from the `{ "error", "code" }` body.
        code: String,
        message: String,
    },
}

/// Error body the server sends with every non-2xx response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
    pub code: String,
}

impl ProxyError {
    /// Build from a status and raw body, tolerating bodies that are not
    /// the server's error JSON (e.g. from a proxy in between).
    pub(crate) fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => Self::Server {
                status,
                code: parsed.code,
                message: parsed.error,
            },
            Err(_) => Self::Server {
                status,
                code: "UNKNOWN".into(),
                message: body.to_string(),
            },
        }
    }
}

/// Rejections keep their meaning; everything else is a transport failure.
impl From<ProxyError> for CoreError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::Server { code, message, .. } => match code.as_str() {
                "VALIDATION_ERROR" | "BAD_REQUEST" => CoreError::Validation(message),
                "MISSING_CONFIGURATION" => CoreError::MissingConfiguration(message),
                "CONFLICT" => CoreError::Conflict(message),
                _ => CoreError::Transport(format!("{code}: {message}")),
            },
            other => CoreError::Transport(other.to_string()),
        }
    }
}
