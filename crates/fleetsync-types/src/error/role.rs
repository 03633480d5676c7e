//! Role state machine errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by role transitions and role-gated operations.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum RoleError {
    /// Operation is only available while acting as leader
    #[error("This node is not acting as leader")]
    NotLeader,

    /// Operation is only available while acting as follower
    #[error("This node is not acting as follower")]
    NotFollower,

    /// Follower has no usable leader connection
    #[error("Not connected to a leader")]
    NotConnected,

    /// The role record changed between read and write
    #[error("Role configuration was modified concurrently (expected version {expected_version})")]
    ConcurrentModification {
        /// Version observed before the write was attempted
        expected_version: i64,
    },
}

impl RoleError {
    /// Check if this is a temporary error that may resolve on retry.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}
