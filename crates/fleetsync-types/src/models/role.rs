//! Process-wide role configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum follower pull interval.
pub const MIN_SYNC_INTERVAL_SECS: u32 = 10;

/// Default follower pull interval.
pub const DEFAULT_SYNC_INTERVAL_SECS: u32 = 60;

/// Whether this deployment is the source of truth or follows one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Source of truth; serves exports
    #[default]
    Leader,
    /// Pulls and reconciles from a leader
    Follower,
}

impl NodeRole {
    /// Storage/wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leader => "leader",
            Self::Follower => "follower",
        }
    }

    /// Parse the storage representation.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "leader" | "master" => Some(Self::Leader),
            "follower" | "slave" => Some(Self::Follower),
            _ => None,
        }
    }
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The singleton role record.
///
/// `version` is bumped by every write and used as an optimistic lock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleConfig {
    /// Current role
    pub role: NodeRole,
    /// Leader host (follower only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_host: Option<String>,
    /// Leader port (follower only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_port: Option<u16>,
    /// Credential presented to the leader. Never serialized.
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Pull cadence in seconds
    pub sync_interval_secs: u32,
    /// Whether the last connection attempt succeeded
    pub connected: bool,
    /// Last successful connect or applied import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_connected_at: Option<DateTime<Utc>>,
    /// Digest of the last snapshot applied locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_applied_digest: Option<String>,
    /// Optimistic lock counter
    pub version: i64,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            role: NodeRole::Leader,
            leader_host: None,
            leader_port: None,
            api_key: None,
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            connected: false,
            last_connected_at: None,
            last_applied_digest: None,
            version: 0,
        }
    }
}

impl RoleConfig {
    /// Base URL of the configured leader, if any.
    ///
    /// A host that already carries a scheme is used verbatim.
    pub fn leader_base_url(&self) -> Option<String> {
        let host = self.leader_host.as_deref()?.trim_end_matches('/');
        let port = self.leader_port?;
        if host.starts_with("http://") || host.starts_with("https://") {
            Some(format!("{host}:{port}"))
        } else {
            Some(format!("http://{host}:{port}"))
        }
    }

    /// Whether a leader credential is held.
    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Whether the scheduler should pull on this tick.
    pub fn should_pull(&self) -> bool {
        self.role == NodeRole::Follower && self.connected && self.has_credential()
    }
}

/// Result of a single authenticated round-trip to the leader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    /// Whether the leader answered successfully
    pub success: bool,
    /// Round-trip latency, absent on failure
    pub latency_ms: Option<u64>,
    /// Status reported by the leader
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader_status: Option<String>,
    /// Human-readable outcome
    pub message: String,
}

impl ConnectionTestResult {
    /// Failed test with a descriptive message and no latency.
    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, latency_ms: None, leader_status: None, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leader_base_url() {
        let mut config = RoleConfig {
            leader_host: Some("10.1.2.3".to_string()),
            leader_port: Some(8070),
            ..RoleConfig::default()
        };
        assert_eq!(config.leader_base_url().as_deref(), Some("http://10.1.2.3:8070"));

        config.leader_host = Some("https://leader.example.com/".to_string());
        assert_eq!(config.leader_base_url().as_deref(), Some("https://leader.example.com:8070"));

        config.leader_port = None;
        assert!(config.leader_base_url().is_none());
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let config = RoleConfig {
            role: NodeRole::Follower,
            api_key: Some("fsk_secret".to_string()),
            ..RoleConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap_or_default();
        assert!(!json.contains("fsk_secret"));
        assert!(json.contains("follower"));
    }

    #[test]
    fn test_role_parse_accepts_legacy_names() {
        assert_eq!(NodeRole::parse("master"), Some(NodeRole::Leader));
        assert_eq!(NodeRole::parse("slave"), Some(NodeRole::Follower));
        assert_eq!(NodeRole::parse("observer"), None);
    }
}
