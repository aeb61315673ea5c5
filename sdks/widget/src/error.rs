//! Error types for the widget transport.

use thiserror::Error;

/// Failure to obtain a usable reply from the chat endpoint.
///
/// Every variant is rendered to the user as the same connection error
/// message; the distinction only matters for logs.
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request failed before a body could be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not a JSON object of the expected shape.
    #[error("invalid response body (status {status}): {source}")]
    Decode {
        /// HTTP status of the response.
        status: u16,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The configured API base does not form a valid endpoint URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connection-level failure reported by a non-HTTP transport.
    #[error("connection failed: {0}")]
    Connection(String),
}
