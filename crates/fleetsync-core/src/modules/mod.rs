//! Node registry, sync protocol, role state machine, and SQLite persistence.

pub mod config;
pub mod credential;
pub mod database;
pub mod digest;
pub mod leader_client;
pub mod reconcile;
pub mod registry;
pub mod repository;
pub mod role;
pub mod snapshot;
pub mod sync_engine;

pub(crate) mod sqlite_config;
pub(crate) mod sqlite_helpers;
pub(crate) mod sqlite_nodes;
pub(crate) mod sqlite_role;

#[cfg(test)]
mod role_tests;
#[cfg(test)]
mod sync_engine_tests;
