//! Error types for bookshelf-core

use crate::StatusCode;
use thiserror::Error;

/// Result type alias for bookshelf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the bookshelf catalog server
#[derive(Debug, Error)]
pub enum Error {
    /// Unrecognized HTTP method token
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Route not found
    #[error("Route not found: {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// Path exists, but not for this method
    #[error("Method {method} not allowed on {path}")]
    MethodNotAllowed {
        method: String,
        path: String,
        allowed: Vec<String>,
    },

    /// A value could not be encoded as JSON
    #[error("JSON encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Input bytes were not a valid JSON document of the expected shape
    #[error("JSON decoding failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// Two books share an ISBN in a keyed catalog
    #[error("Duplicate ISBN in keyed catalog: {0}")]
    DuplicateIsbn(String),

    /// Invalid configuration value
    #[error("Configuration error: {field}: {reason}")]
    Config { field: String, reason: String },

    /// IO error (native only)
    #[cfg(feature = "native")]
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a configuration error
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Decode(_) => StatusCode::BAD_REQUEST,
            Error::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Error::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Error::InvalidMethod(_) => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
