//! Domain-level error types for rcm-manager.
//!
//! All errors are typed with `thiserror` and classified at the component
//! boundary: nothing crosses a layer as an unclassified failure.

use thiserror::Error;

/// Application-level errors, grouped by how callers should react.
#[derive(Error, Debug)]
pub enum AppError {
    /// A single device scan failed. The last known status is unchanged and
    /// the next poll retries; never fatal.
    #[error("Device scan failed: {message}")]
    TransientDevice { message: String },

    /// An operation was rejected before any side effect took place
    /// (no payload selected, device not in RCM, duplicate request).
    #[error("{message}")]
    Precondition { message: String },

    /// The injection or download primitive reported failure. Terminal for
    /// that attempt; nothing is retried automatically.
    #[error("Operation failed: {message}")]
    Operation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote release catalog could not be fetched. Degrades to an
    /// empty catalog at the adapter boundary.
    #[error("Release catalog unavailable: {message}")]
    CatalogUnavailable { message: String },

    /// Failed to open or mutate the payload store.
    #[error("Store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl AppError {
    /// Create a transient device error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientDevice {
            message: message.into(),
        }
    }

    /// Create a precondition rejection.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Create an operation failure without an underlying source.
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
            source: None,
        }
    }

    /// Create an operation failure from an underlying error.
    pub fn operation_with(
        message: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Operation {
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }

    /// Create a store error from a rusqlite error.
    pub fn store(err: rusqlite::Error) -> Self {
        Self::Store {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
