//! # fleetsync Core
//!
//! Synchronization logic shared by every fleetsync node.
//!
//! ```text
//! fleetsync-core/src/
//! ├── modules/
//! │   ├── registry.rs       # Leader-side follower registry
//! │   ├── credential.rs     # API key issuance and lookup
//! │   ├── snapshot.rs       # Identifier-free config aggregation
//! │   ├── digest.rs         # Canonical content hashing
//! │   ├── reconcile.rs      # Business-key diffing
//! │   ├── sync_engine.rs    # Export / import / local digest
//! │   ├── role.rs           # Leader / follower state machine
//! │   ├── leader_client.rs  # Follower → leader HTTP client
//! │   └── sqlite_*.rs       # SQLite persistence
//! └── utils/
//! ```
//!
//! Persistence sits behind the repository traits in
//! [`modules::repository`]; the services take `Arc<dyn …Repository>` so the
//! server can share one [`modules::database::SqliteStore`] across all of them.

#![allow(
    clippy::significant_drop_tightening,
    reason = "Mutex guards in async code require careful lifetime management"
)]
#![allow(clippy::map_err_ignore, reason = "Error context is provided in the replacement message")]
#![allow(
    clippy::redundant_else,
    reason = "Explicit else blocks improve readability in complex control flow"
)]
// Test-only lints: allow panic!, println!, etc. in test code
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::needless_collect,
        clippy::assertions_on_result_states
    )
)]

pub mod error;
pub mod modules;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{AppError, AppResult};
pub use modules::database::SqliteStore;
pub use modules::leader_client::LeaderClient;
pub use modules::registry::{NodeRegistry, RegisterNode};
pub use modules::role::{ConnectRequest, RoleManager};
pub use modules::sync_engine::SyncEngine;
