//! Error types for the CouchDB MCP Server.
//!
//! This module defines all error types using `thiserror` for ergonomic error
//! handling. The taxonomy mirrors what CouchDB can actually signal: connectivity
//! failures, missing databases/documents, revision conflicts, and duplicate
//! database creation each get their own variant so callers can tell them apart.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CouchError {
    #[error("Failed to connect to CouchDB at {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Database '{name}' not found")]
    DatabaseNotFound { name: String },

    #[error("Document '{id}' not found")]
    DocumentNotFound { id: String },

    #[error("Database '{name}' already exists")]
    AlreadyExists { name: String },

    #[error("Document conflict: {message}")]
    Conflict { message: String },

    #[error("Operation not supported by the server: {operation}")]
    Unsupported { operation: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("CouchDB returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CouchError {
    /// Create a connection error carrying the configured URL and cause.
    pub fn connection(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a database-not-found error.
    pub fn database_not_found(name: impl Into<String>) -> Self {
        Self::DatabaseNotFound { name: name.into() }
    }

    /// Create a document-not-found error.
    pub fn document_not_found(id: impl Into<String>) -> Self {
        Self::DocumentNotFound { id: id.into() }
    }

    /// Create a database-already-exists error.
    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists { name: name.into() }
    }

    /// Create a revision conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create an unsupported-operation error. Signals the query fallback path.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an error for an unexpected HTTP status.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error describes an expected database condition (absent
    /// resource, duplicate creation, stale revision) rather than a failure.
    /// These are reported to the caller as descriptive text, never as a
    /// protocol error.
    pub fn is_friendly(&self) -> bool {
        matches!(
            self,
            Self::DatabaseNotFound { .. }
                | Self::DocumentNotFound { .. }
                | Self::AlreadyExists { .. }
                | Self::Conflict { .. }
        )
    }
}

/// Result type alias for CouchDB operations.
pub type CouchResult<T> = Result<T, CouchError>;

/// Convert CouchError to MCP ErrorData for semantic error categorization.
impl From<CouchError> for rmcp::ErrorData {
    fn from(err: CouchError) -> Self {
        match &err {
            // Malformed or rejected input -> invalid_params
            CouchError::InvalidInput { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), None)
            }

            // Absent resources -> resource_not_found
            CouchError::DatabaseNotFound { .. } | CouchError::DocumentNotFound { .. } => {
                rmcp::ErrorData::resource_not_found(err.to_string(), None)
            }

            // Everything else (connectivity, conflicts that escaped friendly
            // rendering, unexpected statuses) -> internal_error
            _ => rmcp::ErrorData::internal_error(err.to_string(), None),
        }
    }
}
