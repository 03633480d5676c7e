//! Canonical content digest of a snapshot.
//!
//! The snapshot is normalized, encoded as compact JSON with fields in
//! declaration order, and hashed with SHA-256. The result is lowercase hex.
//! Equal configuration on two nodes yields the same digest regardless of
//! insertion order or local ids.

use sha2::{Digest, Sha256};

use fleetsync_types::Snapshot;

use crate::error::AppResult;

/// Canonical byte encoding used for hashing.
pub fn canonical_bytes(snapshot: &Snapshot) -> AppResult<Vec<u8>> {
    let normalized = snapshot.clone().normalized();
    Ok(serde_json::to_vec(&normalized)?)
}

pub fn digest(snapshot: &Snapshot) -> AppResult<String> {
    let bytes = canonical_bytes(snapshot)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}
