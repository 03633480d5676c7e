//! Unified error types for fleetsync core.

use fleetsync_types::{AuthError, NodeError, RoleError, SyncError, TypedError, ValidationError};
use serde::Serialize;
use thiserror::Error;

use crate::modules::repository::RepositoryError;

/// Main error type for all core operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// A classified domain failure (validation, auth, sync, role, ...).
    #[error(transparent)]
    Typed(#[from] TypedError),

    /// Storage operation failed (SQLite).
    #[error("Database error: {0}")]
    Database(String),

    /// SQLite was busy or locked by another writer.
    #[error("Database busy: {0}")]
    Busy(String),

    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// The typed domain error, if this is one.
    pub const fn typed(&self) -> Option<&TypedError> {
        match self {
            Self::Typed(err) => Some(err),
            _ => None,
        }
    }

    /// Check if retrying later may succeed.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Typed(err) => err.is_transient(),
            Self::Busy(_) => true,
            _ => false,
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for core operations.
pub type AppResult<T> = Result<T, AppError>;

macro_rules! typed_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for AppError {
                fn from(err: $ty) -> Self {
                    Self::Typed(TypedError::from(err))
                }
            }
        )*
    };
}

typed_from!(ValidationError, NodeError, AuthError, SyncError, RoleError);

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => NodeError::NotFound { id }.into(),
            RepositoryError::AlreadyExists(name) => NodeError::Duplicate { name }.into(),
            RepositoryError::Conflict { expected_version } => {
                RoleError::ConcurrentModification { expected_version }.into()
            },
            RepositoryError::Busy(msg) => Self::Busy(msg),
            RepositoryError::Database(msg) | RepositoryError::Serialization(msg) => {
                Self::Database(msg)
            },
        }
    }
}
