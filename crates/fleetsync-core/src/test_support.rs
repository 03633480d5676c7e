//! Shared fixtures for unit tests.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use fleetsync_types::{Backend, DomainConfig};

use crate::modules::database::SqliteStore;

pub(crate) async fn memory_store() -> Arc<SqliteStore> {
    let store = SqliteStore::in_memory().await.expect("open in-memory sqlite");
    store.run_migrations().await.expect("migrations");
    Arc::new(store)
}

pub(crate) fn domain(name: &str, port: u16) -> DomainConfig {
    DomainConfig::new(name, Backend { address: "10.0.0.1".into(), port, weight: 1 })
}
