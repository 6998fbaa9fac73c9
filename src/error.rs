// src/error.rs

use thiserror::Error;

/// Core error types for release-line tracking
#[derive(Error, Debug)]
pub enum Error {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database initialization error
    #[error("Failed to initialize database: {0}")]
    InitError(String),

    /// Database not found
    #[error("Database not found at path: {0}")]
    DatabaseNotFound(String),

    /// A record-store handle was not supplied when building the models
    #[error("Models are required: missing {0} model")]
    MissingModel(&'static str),

    /// "latest" could not be resolved because the package has no head
    #[error("Cannot {action} without version or a release-line-head (package: {pkg})")]
    NoHead { action: &'static str, pkg: String },

    /// A release cannot be created under the "latest" sentinel or an empty version
    #[error("Invalid release version: {0:?} is reserved")]
    ReservedVersion(String),

    /// Failure reported by a record-store collaborator
    #[error("Store error: {0}")]
    Store(String),

    /// A blocking store task panicked or was cancelled
    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The shared database connection lock was poisoned
    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

impl Error {
    /// Whether this error is a precondition failure rather than a storage failure
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::MissingModel(_) | Error::NoHead { .. } | Error::ReservedVersion(_)
        )
    }
}

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
