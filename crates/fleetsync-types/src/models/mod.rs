//! Core domain models for fleetsync.
//!
//! This module contains all shared data structures used across the workspace.

mod config;
mod node;
mod role;
mod snapshot;
mod sync;

// Re-export all models
pub use config::AppConfig;
pub use node::{HealthRecord, NodeIdentity, NodeStatus, RegisteredNode};
pub use role::{
    ConnectionTestResult, NodeRole, RoleConfig, DEFAULT_SYNC_INTERVAL_SECS, MIN_SYNC_INTERVAL_SECS,
};
pub use snapshot::{
    AccessAction, AccessRule, Backend, Category, Certificate, DomainConfig, LbPolicy, Snapshot,
    SyncEntity, UserAccount, WafRule, WafRuleKind,
};
pub use sync::{CategoryCounts, DigestReport, ExportResponse, ImportOutcome};
