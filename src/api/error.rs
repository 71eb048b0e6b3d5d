/// Errors that can occur while talking to the trip backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("server returned {status}{}", message_suffix(.message))]
    Status {
        /// HTTP status code.
        status: u16,
        /// The `message` field of the error body, when present.
        message: Option<String>,
    },

    /// A response body did not have the expected JSON shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A response decoded but lacked data the client relies on.
    #[error("invalid response from server: {0}")]
    InvalidResponse(String),
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl ApiError {
    /// Message suitable for showing to the user.
    ///
    /// Prefers the server-provided message and falls back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}
