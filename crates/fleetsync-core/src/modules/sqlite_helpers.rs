//! Helper functions for SQLite persistence.

use chrono::{DateTime, TimeZone, Utc};
use fleetsync_types::{NodeIdentity, NodeRole, NodeStatus, RoleConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::modules::repository::{RepoResult, RepositoryError};

/// Primary result codes SQLITE_BUSY and SQLITE_LOCKED.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

pub(crate) fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    if is_busy(&err) {
        return RepositoryError::Busy(err.to_string());
    }
    RepositoryError::Database(err.to_string())
}

/// Extended codes (e.g. SQLITE_BUSY_SNAPSHOT = 517) carry the primary code
/// in the low byte.
pub(crate) fn is_busy_code(code: &str) -> bool {
    code.parse::<i32>().is_ok_and(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().is_some_and(|code| is_busy_code(&code)),
        _ => false,
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn ser_err(err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Serialization(err.to_string())
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> RepoResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| ser_err(format!("timestamp out of range: {ms}")))
}

/// Encode a unit enum as its serde string form (e.g. `round_robin`).
pub(crate) fn encode_enum<T: Serialize>(value: &T) -> RepoResult<String> {
    match serde_json::to_value(value).map_err(ser_err)? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(ser_err(format!("expected string-like enum, got {other}"))),
    }
}

pub(crate) fn decode_enum<T: DeserializeOwned>(raw: &str) -> RepoResult<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).map_err(ser_err)
}

pub(crate) fn encode_json<T: Serialize>(value: &T) -> RepoResult<String> {
    serde_json::to_string(value).map_err(ser_err)
}

pub(crate) fn decode_json<T: DeserializeOwned>(raw: &str) -> RepoResult<T> {
    serde_json::from_str(raw).map_err(ser_err)
}

pub(crate) fn get<'r, T>(row: &'r SqliteRow, column: &str) -> RepoResult<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(map_sqlx_err)
}

fn port_from(raw: i64) -> RepoResult<u16> {
    u16::try_from(raw).map_err(|_| ser_err(format!("port out of range: {raw}")))
}

fn interval_from(raw: i64) -> RepoResult<u32> {
    u32::try_from(raw).map_err(|_| ser_err(format!("interval out of range: {raw}")))
}

/// Convert a `nodes` row to a NodeIdentity.
pub(crate) fn row_to_node(row: &SqliteRow) -> RepoResult<NodeIdentity> {
    let status: String = get(row, "status")?;
    let last_seen: Option<i64> = get(row, "last_seen")?;

    Ok(NodeIdentity {
        id: get(row, "id")?,
        name: get(row, "name")?,
        host: get(row, "host")?,
        port: port_from(get(row, "port")?)?,
        sync_enabled: get(row, "sync_enabled")?,
        sync_interval_secs: interval_from(get(row, "sync_interval_secs")?)?,
        status: NodeStatus::parse(&status),
        last_seen: last_seen.map(from_millis).transpose()?,
        last_known_digest: get(row, "last_known_digest")?,
        created_at: from_millis(get(row, "created_at")?)?,
    })
}

/// Convert the singleton `role_config` row.
pub(crate) fn row_to_role(row: &SqliteRow) -> RepoResult<RoleConfig> {
    let role: String = get(row, "role")?;
    let leader_port: Option<i64> = get(row, "leader_port")?;
    let last_connected_at: Option<i64> = get(row, "last_connected_at")?;

    Ok(RoleConfig {
        role: NodeRole::parse(&role).ok_or_else(|| ser_err(format!("unknown role: {role}")))?,
        leader_host: get(row, "leader_host")?,
        leader_port: leader_port.map(port_from).transpose()?,
        api_key: get(row, "api_key")?,
        sync_interval_secs: interval_from(get(row, "sync_interval_secs")?)?,
        connected: get(row, "connected")?,
        last_connected_at: last_connected_at.map(from_millis).transpose()?,
        last_applied_digest: get(row, "last_applied_digest")?,
        version: get(row, "version")?,
    })
}
