//! Common error types used throughout localflix.
//!
//! This module provides a unified error type that covers the failure cases
//! of the library, catalog and asset layers, and maps each one to an HTTP
//! status code via [`Error::http_status`].

use std::fmt;

/// Common error type for localflix.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "folder", "file").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request conflicts with existing state (duplicate name, etc).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An external tool failed.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The database row was deleted but the filesystem cleanup did not finish.
    #[error("Partial cleanup of {entity} {id}: record deleted but {detail}")]
    PartialCleanup {
        /// The kind of entity that was being deleted.
        entity: String,
        /// The identifier of the deleted entity.
        id: String,
        /// What was left behind.
        detail: String,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Conflict error.
    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a new Tool error.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a new PartialCleanup error.
    pub fn partial_cleanup(
        entity: impl Into<String>,
        id: impl fmt::Display,
        detail: impl Into<String>,
    ) -> Self {
        Self::PartialCleanup {
            entity: entity.into(),
            id: id.to_string(),
            detail: detail.into(),
        }
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Map this error to an HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::InvalidInput(_) => 400,
            Error::Conflict(_) => 409,
            Error::Database(_) => 500,
            Error::Io(_) => 500,
            Error::Tool { .. } => 500,
            Error::PartialCleanup { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::InvalidInput(_) => "validation_error",
            Error::Conflict(_) => "conflict",
            Error::Database(_) => "database_error",
            Error::Io(_) => "io_error",
            Error::Tool { .. } => "tool_error",
            Error::PartialCleanup { .. } => "partial_cleanup",
            Error::Internal(_) => "internal_error",
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
