use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ApiError {
    /// Request never produced a response (connect, timeout, TLS, body read).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response; `message` is the body's `error` field when present.
    #[error("server returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Server {
        status: StatusCode,
        message: Option<String>,
    },

    /// 2xx response whose body could not be decoded.
    #[error("malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid endpoint URL: {0}")]
    Url(String),

    #[error("no output file named {0:?} in the current list")]
    UnknownFile(String),

    #[error("file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Message to show the user: the server's own message verbatim, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Server {
                message: Some(m), ..
            } if !m.trim().is_empty() => m.clone(),
            ApiError::UnknownFile(_) => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Extract `{ "error": "..." }` from a failure body, if it has that shape.
pub(crate) fn extract_error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
}
