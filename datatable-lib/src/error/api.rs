//! API error types

use std::time::Duration;

use super::MappingError;

/// Errors that can occur while fetching a page from the backend.
///
/// These are recovered locally by the controller: the message lands in
/// [`ViewState::error`](crate::model::ViewState) and the previous rows stay
/// on screen.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-success HTTP status from the backend.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message (the backend's `message` field when it sent one).
        message: String,
    },

    /// Network error during the request.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Transport failure that did not come from reqwest.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request timed out.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to decode the response body.
    #[error("Response parse error: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
        /// Raw response body, if available.
        body: Option<String>,
    },

    /// The response body did not match any known record layout.
    #[error("Unexpected response shape: {0}")]
    Mapping(#[from] MappingError),
}

impl ApiError {
    /// Creates a new HTTP error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates an HTTP error from a raw error body.
    ///
    /// JSON bodies carrying a string `message` (or `error`) field use that as
    /// the message. Anything else is used verbatim, falling back to the
    /// canonical reason phrase for empty bodies.
    pub fn http_from_body(status: u16, body: &str) -> Self {
        let from_json = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["message", "error"]
                    .iter()
                    .find_map(|key| value.get(*key)?.as_str().map(str::to_string))
            });

        let message = match from_json {
            Some(message) => message,
            None if body.trim().is_empty() => reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("request failed")
                .to_string(),
            None => body.trim().to_string(),
        };

        Self::http(status, message)
    }

    /// Creates a new parse error with the raw response body.
    pub fn parse_with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// Returns the HTTP status code if this is an HTTP error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
