//! Cloud driver error types

use thiserror::Error;

/// Cloud driver errors
///
/// Every variant carries a human-readable context string naming the
/// resource, the operation, and (where known) the provider.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Timeout exceeded: {operation} did not complete after {attempts} attempts")]
    TimeoutExceeded { operation: String, attempts: u32 },

    #[error("Metadata store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of a [`CloudError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidState,
    InvalidArgument,
    NotSupported,
    UpstreamError,
    TimeoutExceeded,
    StoreUnavailable,
    Cancelled,
}

impl CloudError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CloudError::NotFound(_) => ErrorKind::NotFound,
            CloudError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            CloudError::InvalidState(_) => ErrorKind::InvalidState,
            CloudError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CloudError::NotSupported(_) => ErrorKind::NotSupported,
            CloudError::UpstreamError(_) | CloudError::Json(_) => ErrorKind::UpstreamError,
            CloudError::TimeoutExceeded { .. } => ErrorKind::TimeoutExceeded,
            CloudError::StoreUnavailable(_) | CloudError::Io(_) => ErrorKind::StoreUnavailable,
            CloudError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    /// Validation failures are raised before any remote mutation and
    /// must never be retried.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::AlreadyExists
                | ErrorKind::InvalidState
                | ErrorKind::InvalidArgument
                | ErrorKind::NotSupported
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Prefix the message with the failing operation, keeping the kind.
    pub fn context(self, operation: impl std::fmt::Display) -> Self {
        match self {
            CloudError::NotFound(m) => CloudError::NotFound(format!("{}: {}", operation, m)),
            CloudError::AlreadyExists(m) => {
                CloudError::AlreadyExists(format!("{}: {}", operation, m))
            }
            CloudError::InvalidState(m) => {
                CloudError::InvalidState(format!("{}: {}", operation, m))
            }
            CloudError::InvalidArgument(m) => {
                CloudError::InvalidArgument(format!("{}: {}", operation, m))
            }
            CloudError::NotSupported(m) => {
                CloudError::NotSupported(format!("{}: {}", operation, m))
            }
            CloudError::UpstreamError(m) => {
                CloudError::UpstreamError(format!("{}: {}", operation, m))
            }
            CloudError::StoreUnavailable(m) => {
                CloudError::StoreUnavailable(format!("{}: {}", operation, m))
            }
            CloudError::Cancelled(m) => CloudError::Cancelled(format!("{}: {}", operation, m)),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
