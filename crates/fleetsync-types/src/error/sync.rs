//! Sync protocol errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by export/import exchanges between leader and follower.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum SyncError {
    /// Leader unreachable, timed out, or answered with a server error
    #[error("Leader unreachable: {message}")]
    TransientNetwork {
        /// Transport-level description
        message: String,
    },

    /// Leader refused the request (bad or disabled credential)
    #[error("Leader rejected request ({status}): {message}")]
    LeaderRejected {
        /// HTTP status returned by the leader
        status: u16,
        /// Body returned by the leader
        message: String,
    },

    /// Leader answered with something that is not an export payload
    #[error("Invalid response from leader: {message}")]
    InvalidResponse {
        /// Parse failure description
        message: String,
    },

    /// The import could not be applied atomically
    #[error("Reconciliation failed: {message}")]
    Reconciliation {
        /// What went wrong
        message: String,
    },
}

impl SyncError {
    /// Check if this is a temporary error that may resolve on retry.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork { .. })
    }
}
