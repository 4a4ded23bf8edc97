//! Error types for leaflet-core

use thiserror::Error;

/// Result type alias using leaflet-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in leaflet-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found where one was required
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote exchange failed
    #[error("Sync error: {0}")]
    Sync(String),
}

impl Error {
    /// Whether this error came from bad caller input rather than storage.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
