//! Client-side error definitions.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while building, writing or sending a client request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request URL could not be parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A header name or value is not valid on the wire.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    /// A cookie name or value would not survive the `cookie` header intact.
    #[error("Invalid cookie '{name}': {reason}")]
    InvalidCookie { name: String, reason: String },

    /// No registered message writer accepts the requested content type.
    #[error("No message writer for content type '{content_type}'")]
    NoWriter { content_type: String },

    /// The payload could not be serialized.
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// The selected writer cannot represent the payload.
    #[error("Unsupported payload for {media_type}: {reason}")]
    UnsupportedPayload {
        media_type: &'static str,
        reason: String,
    },

    /// A custom body inserter failed.
    #[error("Body insertion failed: {0}")]
    Body(String),

    /// The outgoing request could not be assembled.
    #[error("HTTP error: {0}")]
    Http(#[from] axum::http::Error),

    /// Connection or protocol failure in the transport.
    #[error("Transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    /// The exchange did not complete in time.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}
