//! Search error types.
//!
//! This module defines the transport-level errors returned when talking to
//! the search engine.

use thiserror::Error;

/// Errors that can occur while sending a request to the search engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Failed to set up a connection to the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request could not be sent or the response could not be read.
    #[error("Request error: {0}")]
    RequestError(String),

    /// The search engine answered with a non-2xx status.
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Failed to serialize a request body.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a request error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::RequestError(msg.into())
    }

    /// Create a status error.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Whether the search engine reported the target as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_not_found() {
        assert!(SearchError::status(404, "index_not_found_exception").is_not_found());
        assert!(!SearchError::status(500, "boom").is_not_found());
        assert!(!SearchError::request("timeout").is_not_found());
    }

    #[test]
    fn test_status_display() {
        let err = SearchError::status(409, "conflict");
        assert_eq!(err.to_string(), "Request failed with status 409: conflict");
    }
}
