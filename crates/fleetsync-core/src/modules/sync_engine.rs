//! Export, import and local digest reporting.
//!
//! The leader exports a normalized snapshot plus its digest to
//! authenticated followers. A follower imports it by verifying the digest,
//! short-circuiting when nothing changed, and otherwise reconciling by
//! business key inside one transaction fenced on the role record.

use std::sync::Arc;

use chrono::Utc;
use fleetsync_types::{
    AuthError, DigestReport, ExportResponse, HealthRecord, ImportOutcome, NodeRole, RoleError,
    SyncError,
};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::modules::credential::CredentialStore;
use crate::modules::digest::digest;
use crate::modules::leader_client::{LeaderClient, NODE_KEY_HEADER, SLAVE_KEY_HEADER};
use crate::modules::reconcile::duplicate_key;
use crate::modules::registry::NodeRegistry;
use crate::modules::repository::{
    ConfigRepository, ImportFence, NodeRepository, RepositoryError, RoleRepository,
};
use crate::modules::role::RoleManager;
use crate::modules::snapshot::SnapshotBuilder;

pub struct SyncEngine {
    credentials: CredentialStore,
    registry: NodeRegistry,
    snapshots: SnapshotBuilder,
    roles: RoleManager,
    config: Arc<dyn ConfigRepository>,
    /// Serializes pulls; a tick that finds it held is skipped.
    pub(crate) pull_guard: Mutex<()>,
}

impl SyncEngine {
    pub fn new(
        nodes: Arc<dyn NodeRepository>,
        config: Arc<dyn ConfigRepository>,
        roles: Arc<dyn RoleRepository>,
    ) -> Self {
        Self {
            credentials: CredentialStore::new(nodes.clone()),
            registry: NodeRegistry::new(nodes),
            snapshots: SnapshotBuilder::new(config.clone()),
            roles: RoleManager::new(roles),
            config,
            pull_guard: Mutex::new(()),
        }
    }

    /// Wire every service to one store.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: NodeRepository + ConfigRepository + RoleRepository + 'static,
    {
        Self::new(store.clone(), store.clone(), store)
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn roles(&self) -> &RoleManager {
        &self.roles
    }

    pub fn config_store(&self) -> &Arc<dyn ConfigRepository> {
        &self.config
    }

    /// Leader: serve the snapshot to an authenticated follower and record
    /// the contact. Rejected callers cause no writes.
    pub async fn export(&self, presented_key: Option<&str>) -> AppResult<ExportResponse> {
        self.roles.require_leader().await?;
        let node = self.credentials.authenticate(presented_key, SLAVE_KEY_HEADER).await?;

        let (config, hash) = self.snapshots.build_with_digest().await?;
        self.registry.record_contact(&node, &hash).await?;

        tracing::info!(
            node = %node.name,
            hash = %hash,
            entities = config.total(),
            "Served config export"
        );
        Ok(ExportResponse { hash, config })
    }

    /// Leader: authenticated health check from a follower.
    pub async fn leader_health(&self, presented_key: Option<&str>) -> AppResult<HealthRecord> {
        self.roles.require_leader().await?;
        let node = self.credentials.authenticate(presented_key, SLAVE_KEY_HEADER).await?;
        Ok(self.registry.health(&node))
    }

    /// Follower: apply a leader export.
    pub async fn import(&self, payload: &ExportResponse) -> AppResult<ImportOutcome> {
        let role = self.roles.require_follower().await?;

        let computed = digest(&payload.config)?;
        if computed != payload.hash {
            tracing::warn!(
                claimed = %payload.hash,
                computed = %computed,
                "Rejected export with mismatched digest"
            );
            return Err(SyncError::Reconciliation {
                message: format!(
                    "digest mismatch: leader sent {}, payload hashes to {computed}",
                    payload.hash
                ),
            }
            .into());
        }

        if let Some((category, key)) = duplicate_key(&payload.config) {
            tracing::warn!(
                category = category.as_str(),
                key = %key,
                "Rejected export with duplicate business key"
            );
            return Err(SyncError::Reconciliation {
                message: format!("duplicate {} key in export: {key}", category.as_str()),
            }
            .into());
        }

        let (_, local_hash) = self.snapshots.build_with_digest().await?;
        if local_hash == payload.hash {
            tracing::debug!(hash = %payload.hash, "Config unchanged, skipping import");
            return Ok(ImportOutcome::unchanged(payload.hash.clone()));
        }

        let fence = ImportFence {
            expected_version: role.version,
            digest: payload.hash.clone(),
            applied_at: Utc::now(),
        };
        let details = self.config.apply_snapshot(&payload.config, &fence).await.map_err(|err| {
            match err {
                RepositoryError::Conflict { .. } | RepositoryError::Busy(_) => AppError::from(err),
                other => SyncError::Reconciliation { message: other.to_string() }.into(),
            }
        })?;

        let outcome = ImportOutcome::applied(payload.hash.clone(), details);
        tracing::info!(hash = %outcome.hash, changes = outcome.changes, "Imported leader config");
        Ok(outcome)
    }

    /// Digest of local state, recomputed now.
    pub async fn report_local_digest(&self) -> AppResult<DigestReport> {
        let role = self.roles.current().await?;
        let (_, hash) = self.snapshots.build_with_digest().await?;
        Ok(DigestReport {
            hash,
            role: role.role,
            last_applied_digest: role.last_applied_digest,
            computed_at: Utc::now(),
        })
    }

    /// Follower: check a caller's `x-api-key` against the held leader key.
    pub async fn verify_held_key(&self, presented_key: Option<&str>) -> AppResult<()> {
        let presented = presented_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AuthError::MissingKey { header: NODE_KEY_HEADER.to_string() })?;

        let role = self.roles.current().await?;
        let held = match (role.role, role.api_key.as_deref()) {
            (NodeRole::Follower, Some(held)) if !held.is_empty() => held,
            _ => return Err(AuthError::UnknownKey.into()),
        };

        if bool::from(presented.as_bytes().ct_eq(held.as_bytes())) {
            Ok(())
        } else {
            Err(AuthError::UnknownKey.into())
        }
    }

    /// Follower: one export → import round. Returns `None` when another
    /// pull already holds the guard.
    pub async fn pull(&self, client: &LeaderClient) -> AppResult<Option<ImportOutcome>> {
        let Ok(_guard) = self.pull_guard.try_lock() else {
            tracing::debug!("Pull already in progress, skipping");
            return Ok(None);
        };

        let role = self.roles.require_follower().await?;
        if !role.should_pull() {
            return Err(RoleError::NotConnected.into());
        }
        let (Some(base_url), Some(key)) = (role.leader_base_url(), role.api_key.as_deref()) else {
            return Err(RoleError::NotConnected.into());
        };

        let export = client.export(&base_url, key).await?;
        self.import(&export).await.map(Some)
    }
}
