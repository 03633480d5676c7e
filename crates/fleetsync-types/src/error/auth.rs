//! Authentication errors for node credentials.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while authenticating a node by its API key.
///
/// `UnknownKey` and `SyncDisabled` are deliberately distinct: the first means
/// the caller is not who it claims to be, the second that it is correctly
/// identified but currently forbidden from syncing.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum AuthError {
    /// The request carried no credential header
    #[error("Missing credential header: {header}")]
    MissingKey {
        /// Header that was expected
        header: String,
    },

    /// The key does not belong to any registered node
    #[error("Unknown or revoked API key")]
    UnknownKey,

    /// The key is valid but sync is disabled for its node
    #[error("Sync is disabled for node {node}")]
    SyncDisabled {
        /// Name of the node the key belongs to
        node: String,
    },
}

impl AuthError {
    /// True when the caller was identified but is not allowed to proceed.
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::SyncDisabled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_is_distinct_from_unknown() {
        assert!(AuthError::SyncDisabled { node: "edge-1".to_string() }.is_forbidden());
        assert!(!AuthError::UnknownKey.is_forbidden());
        assert!(!AuthError::MissingKey { header: "x-slave-api-key".to_string() }.is_forbidden());
    }
}
