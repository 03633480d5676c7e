//! # fleetsync Types
//!
//! Core types, models, and error definitions for fleetsync.
//!
//! This crate provides the foundational type system shared by the core
//! library and the server daemon:
//!
//! - **`error`** - Typed error hierarchy (validation, nodes, auth, sync, roles)
//! - **`models`** - Domain models (node identities, role configuration,
//!   configuration snapshots, sync payloads, app config)
//!
//! ## Architecture Role
//!
//! `fleetsync-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!          fleetsync-types (this crate)
//!                  │
//!                  ▼
//!           fleetsync-core
//!                  │
//!                  ▼
//!          fleetsync-server
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for the HTTP API and persisted config
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{AuthError, NodeError, Result, RoleError, SyncError, TypedError, ValidationError};

// Re-export core model types
pub use models::{
    AccessAction, AccessRule, AppConfig, Backend, Category, CategoryCounts, Certificate,
    ConnectionTestResult, DigestReport, DomainConfig, ExportResponse, HealthRecord, ImportOutcome,
    LbPolicy, NodeIdentity, NodeRole, NodeStatus, RegisteredNode, RoleConfig, Snapshot,
    SyncEntity, UserAccount, WafRule, WafRuleKind, DEFAULT_SYNC_INTERVAL_SECS,
    MIN_SYNC_INTERVAL_SECS,
};
