//! Node registry errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the leader-side node registry.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum NodeError {
    /// A node with this name is already registered
    #[error("Node already registered: {name}")]
    Duplicate {
        /// The colliding node name
        name: String,
    },

    /// No node exists with the given id
    #[error("Node not found: {id}")]
    NotFound {
        /// Identifier that was looked up
        id: String,
    },
}
