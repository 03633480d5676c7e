//! Leader-side registry of follower nodes.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use fleetsync_types::{
    HealthRecord, NodeIdentity, RegisteredNode, ValidationError,
    DEFAULT_SYNC_INTERVAL_SECS, MIN_SYNC_INTERVAL_SECS,
};
use regex::Regex;
use serde::Deserialize;

use crate::error::AppResult;
use crate::modules::credential::generate_key;
use crate::modules::repository::{NewNode, NodeRepository};

static NODE_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn node_name_regex() -> &'static Regex {
    NODE_NAME_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,63}$").expect("Node name regex is valid")
    })
}

/// Registration request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterNode {
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub sync_interval_secs: Option<u32>,
}

impl RegisterNode {
    fn validate(&self) -> Result<u32, ValidationError> {
        if !node_name_regex().is_match(&self.name) {
            return Err(ValidationError::new(
                "name",
                "must be 1-64 characters of letters, digits, '.', '_' or '-'",
            ));
        }
        if self.host.trim().is_empty() {
            return Err(ValidationError::new("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(ValidationError::new("port", "must be between 1 and 65535"));
        }
        let interval = self.sync_interval_secs.unwrap_or(DEFAULT_SYNC_INTERVAL_SECS);
        if interval < MIN_SYNC_INTERVAL_SECS {
            return Err(ValidationError::new(
                "syncIntervalSecs",
                format!("must be at least {MIN_SYNC_INTERVAL_SECS} seconds"),
            ));
        }
        Ok(interval)
    }
}

#[derive(Clone)]
pub struct NodeRegistry {
    nodes: Arc<dyn NodeRepository>,
}

impl NodeRegistry {
    pub fn new(nodes: Arc<dyn NodeRepository>) -> Self {
        Self { nodes }
    }

    /// Register a follower and issue its API key. The plaintext key is only
    /// ever returned from here.
    pub async fn register(&self, request: RegisterNode) -> AppResult<RegisteredNode> {
        let interval = request.validate()?;
        let issued = generate_key();

        let node = self
            .nodes
            .insert_node(NewNode {
                name: request.name,
                host: request.host.trim().to_string(),
                port: request.port,
                api_key_hash: issued.hash,
                sync_interval_secs: interval,
            })
            .await?;

        tracing::info!(node = %node.name, id = %node.id, "Registered follower node");

        Ok(RegisteredNode {
            id: node.id,
            name: node.name,
            host: node.host,
            port: node.port,
            api_key: issued.plaintext,
            status: node.status,
        })
    }

    pub async fn list(&self) -> AppResult<Vec<NodeIdentity>> {
        Ok(self.nodes.list_nodes().await?)
    }

    pub async fn get(&self, id: &str) -> AppResult<NodeIdentity> {
        Ok(self.nodes.get_node(id).await?)
    }

    /// Remove a node; its key stops authenticating immediately.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.nodes.delete_node(id).await?;
        tracing::info!(id = %id, "Removed follower node");
        Ok(())
    }

    pub async fn set_sync_enabled(&self, id: &str, enabled: bool) -> AppResult<NodeIdentity> {
        let node = self.nodes.set_sync_enabled(id, enabled).await?;
        tracing::info!(node = %node.name, enabled, "Updated node sync flag");
        Ok(node)
    }

    /// Stamp a successful export pull by `node`.
    pub async fn record_contact(&self, node: &NodeIdentity, digest: &str) -> AppResult<()> {
        self.nodes.record_contact(&node.id, digest, Utc::now()).await?;
        tracing::debug!(node = %node.name, digest = %digest, "Recorded follower contact");
        Ok(())
    }

    /// Answer an authenticated health check. Read-only.
    pub fn health(&self, node: &NodeIdentity) -> HealthRecord {
        HealthRecord {
            status: "ok".to_string(),
            node: node.name.clone(),
            node_status: node.status,
            timestamp: Utc::now(),
        }
    }

    /// Mark online nodes that missed `multiplier` intervals as offline.
    /// Returns the names that changed. A multiplier of 0 disables the sweep.
    pub async fn sweep_stale(&self, now: DateTime<Utc>, multiplier: u32) -> AppResult<Vec<String>> {
        if multiplier == 0 {
            return Ok(Vec::new());
        }

        let names = self.nodes.mark_stale(now, multiplier).await?;
        if !names.is_empty() {
            tracing::info!(nodes = ?names, "Marked stale nodes offline");
        }
        Ok(names)
    }
}
