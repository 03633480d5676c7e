//! Leader-side node identity records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a registered follower.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Contacted the leader recently
    Online,
    /// Never contacted, or stale
    #[default]
    Offline,
    /// An exchange is in progress
    Syncing,
    /// Last exchange failed
    Error,
}

impl NodeStatus {
    /// Storage/wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Syncing => "syncing",
            Self::Error => "error",
        }
    }

    /// Parse the storage representation; unknown values read as `Error`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "online" => Self::Online,
            "offline" => Self::Offline,
            "syncing" => Self::Syncing,
            _ => Self::Error,
        }
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A follower registered on the leader.
///
/// The API key is never part of this record; only its hash is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeIdentity {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Operator-chosen unique name
    pub name: String,
    /// Follower host
    pub host: String,
    /// Follower port
    pub port: u16,
    /// Whether this follower may pull
    pub sync_enabled: bool,
    /// Expected pull cadence in seconds
    pub sync_interval_secs: u32,
    /// Lifecycle status
    pub status: NodeStatus,
    /// Last successful authenticated contact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    /// Digest offered to this follower on its last export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_known_digest: Option<String>,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl NodeIdentity {
    /// `host:port` of the follower.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Registration response. The only place an API key is ever returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredNode {
    /// Unique identifier
    pub id: String,
    /// Node name
    pub name: String,
    /// Follower host
    pub host: String,
    /// Follower port
    pub port: u16,
    /// One-time plaintext API key
    pub api_key: String,
    /// Initial status (always offline)
    pub status: NodeStatus,
}

/// Timestamped liveness record returned to an authenticated follower.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    /// Leader status string ("ok")
    pub status: String,
    /// Name the leader knows the caller by
    pub node: String,
    /// Registry status of the caller
    pub node_status: NodeStatus,
    /// Leader clock at response time
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_strings() {
        for status in
            [NodeStatus::Online, NodeStatus::Offline, NodeStatus::Syncing, NodeStatus::Error]
        {
            assert_eq!(NodeStatus::parse(status.as_str()), status);
        }
        assert_eq!(NodeStatus::parse("garbage"), NodeStatus::Error);
    }

    #[test]
    fn test_identity_never_serializes_key_material() {
        let node = NodeIdentity {
            id: "id".to_string(),
            name: "edge-1".to_string(),
            host: "10.0.0.2".to_string(),
            port: 8070,
            sync_enabled: true,
            sync_interval_secs: 30,
            status: NodeStatus::Online,
            last_seen: None,
            last_known_digest: None,
            created_at: Utc::now(),
        };
        assert_eq!(node.address(), "10.0.0.2:8070");

        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("apiKey").is_none());
        assert!(json.get("apiKeyHash").is_none());
        assert_eq!(json["status"], "online");
    }
}
