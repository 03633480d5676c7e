//! Export / import payloads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, NodeRole, Snapshot};

/// Body of the leader's export endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportResponse {
    /// Digest of `config`
    pub hash: String,
    /// Normalized snapshot
    pub config: Snapshot,
}

/// Per-category reconciliation counts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CategoryCounts {
    /// Entities created locally
    pub created: usize,
    /// Entities overwritten locally
    pub updated: usize,
}

impl CategoryCounts {
    /// created + updated
    pub const fn total(&self) -> usize {
        self.created + self.updated
    }
}

/// Result of an import on the follower.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Whether any reconciliation ran
    pub imported: bool,
    /// Digest received from the leader
    pub hash: String,
    /// Entities created + updated
    pub changes: usize,
    /// Per-category breakdown, present when `imported`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<Category, CategoryCounts>>,
}

impl ImportOutcome {
    /// The idempotent no-op result.
    pub fn unchanged(hash: impl Into<String>) -> Self {
        Self { imported: false, hash: hash.into(), changes: 0, details: None }
    }

    /// An applied import with its per-category breakdown.
    pub fn applied(hash: impl Into<String>, details: BTreeMap<Category, CategoryCounts>) -> Self {
        let changes = details.values().map(CategoryCounts::total).sum();
        Self { imported: true, hash: hash.into(), changes, details: Some(details) }
    }
}

/// Locally recomputed digest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DigestReport {
    /// Local digest
    pub hash: String,
    /// Role at computation time
    pub role: NodeRole,
    /// Digest of the last applied import, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_applied_digest: Option<String>,
    /// When the digest was computed
    pub computed_at: DateTime<Utc>,
}
