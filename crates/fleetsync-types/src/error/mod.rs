//! Typed error definitions for fleetsync.
//!
//! This module provides a structured error hierarchy with specific error types
//! for different domains. All errors are designed to be:
//!
//! - **Serializable** for API responses via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for error handling logic via enum variants
//! - **Composable** via thiserror derive macros

mod auth;
mod node;
mod role;
mod sync;

pub use auth::AuthError;
pub use node::NodeError;
pub use role::RoleError;
pub use sync::SyncError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bad input: missing fields, malformed values, interval below the floor.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("Validation error for {field}: {message}")]
pub struct ValidationError {
    /// Name of the field that failed validation
    pub field: String,
    /// Description of the validation failure
    pub message: String,
}

impl ValidationError {
    /// Build a validation error for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Unified error type that wraps all domain-specific errors.
///
/// Use this when you need a single error type that can represent
/// any fleetsync error.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "domain", content = "error")]
pub enum TypedError {
    /// Rejected input
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Wraps a node registry error
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    /// Wraps an authentication error
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Wraps a sync protocol error
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Wraps a role state machine error
    #[error("Role error: {0}")]
    Role(#[from] RoleError),
}

impl TypedError {
    /// Check if this is a temporary error that may resolve on retry.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Sync(err) => err.is_transient(),
            Self::Role(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Standard Result type using TypedError.
pub type Result<T> = std::result::Result<T, TypedError>;
