//! Follower API keys: issuance, hashing and lookup.
//!
//! Keys are `fsk_` followed by 32 random bytes in URL-safe base64. Only the
//! SHA-256 hash is persisted; the plaintext is returned once at registration.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use fleetsync_types::{AuthError, NodeIdentity};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::AppResult;
use crate::modules::repository::NodeRepository;

pub const API_KEY_PREFIX: &str = "fsk_";
const KEY_BYTES: usize = 32;

/// A freshly issued key and the hash to store for it.
#[derive(Debug, Clone)]
pub struct IssuedKey {
    pub plaintext: String,
    pub hash: String,
}

pub fn generate_key() -> IssuedKey {
    let mut bytes = [0u8; KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let plaintext = format!("{API_KEY_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes));
    let hash = hash_key(&plaintext);
    IssuedKey { plaintext, hash }
}

pub fn hash_key(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

/// Constant-time comparison against a stored hash.
pub fn verify_key(candidate: &str, stored_hash: &str) -> bool {
    let computed = hash_key(candidate);
    computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

/// Resolves presented keys to registered nodes.
#[derive(Clone)]
pub struct CredentialStore {
    nodes: Arc<dyn NodeRepository>,
}

impl CredentialStore {
    pub fn new(nodes: Arc<dyn NodeRepository>) -> Self {
        Self { nodes }
    }

    /// Map a key to its node without checking `sync_enabled`.
    pub async fn resolve(&self, key: &str) -> AppResult<NodeIdentity> {
        let hash = hash_key(key);
        match self.nodes.find_by_key_hash(&hash).await? {
            Some((node, stored)) if verify_key(key, &stored) => Ok(node),
            _ => Err(AuthError::UnknownKey.into()),
        }
    }

    /// Authenticate a request header value for sync.
    ///
    /// Missing or blank → `MissingKey`; no match → `UnknownKey`; matched but
    /// disabled → `SyncDisabled`. Never mutates the registry.
    pub async fn authenticate(&self, presented: Option<&str>, header: &str) -> AppResult<NodeIdentity> {
        let key = presented.map(str::trim).filter(|k| !k.is_empty()).ok_or_else(|| {
            AuthError::MissingKey { header: header.to_string() }
        })?;

        let node = self.resolve(key).await?;
        if !node.sync_enabled {
            tracing::warn!(node = %node.name, "Rejected sync from disabled node");
            return Err(AuthError::SyncDisabled { node: node.name }.into());
        }
        Ok(node)
    }
}
