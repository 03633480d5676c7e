//! Snapshot construction from local storage.

use std::sync::Arc;

use fleetsync_types::Snapshot;

use crate::error::AppResult;
use crate::modules::digest::digest;
use crate::modules::repository::ConfigRepository;

/// Builds normalized snapshots from the config repository.
#[derive(Clone)]
pub struct SnapshotBuilder {
    config: Arc<dyn ConfigRepository>,
}

impl SnapshotBuilder {
    pub fn new(config: Arc<dyn ConfigRepository>) -> Self {
        Self { config }
    }

    /// Read-consistent, identifier-free, normalized snapshot.
    pub async fn build(&self) -> AppResult<Snapshot> {
        let snapshot = self.config.load_snapshot().await?;
        Ok(snapshot.normalized())
    }

    /// Snapshot together with its digest.
    pub async fn build_with_digest(&self) -> AppResult<(Snapshot, String)> {
        let snapshot = self.build().await?;
        let hash = digest(&snapshot)?;
        Ok((snapshot, hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{domain, memory_store};

    #[tokio::test]
    async fn test_build_is_deterministic() {
        let store = memory_store().await;
        store
            .save_entities(&Snapshot {
                domains: vec![domain("z.com", 80), domain("a.com", 80)],
                ..Default::default()
            })
            .await
            .unwrap();
        let builder = SnapshotBuilder::new(store);

        let (first, h1) = builder.build_with_digest().await.unwrap();
        let (second, h2) = builder.build_with_digest().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(h1, h2);
        assert_eq!(first.domains[0].domain, "a.com");
    }
}
