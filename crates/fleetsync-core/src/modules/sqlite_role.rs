use fleetsync_types::RoleConfig;
use sqlx::sqlite::SqlitePool;

use crate::modules::repository::{RepoResult, RepositoryError};
use crate::modules::sqlite_helpers::{map_sqlx_err, row_to_role, to_millis};

const ROLE_COLUMNS: &str = "role, leader_host, leader_port, api_key, sync_interval_secs, \
                            connected, last_connected_at, last_applied_digest, version";

pub async fn load_role_impl(pool: &SqlitePool) -> RepoResult<RoleConfig> {
    let row = sqlx::query(&format!("SELECT {ROLE_COLUMNS} FROM role_config WHERE id = 1"))
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_err)?;

    match row {
        Some(row) => row_to_role(&row),
        // Migration seeds the row; a missing one means the table was wiped.
        None => Ok(RoleConfig::default()),
    }
}

pub async fn store_role_impl(pool: &SqlitePool, next: &RoleConfig) -> RepoResult<RoleConfig> {
    let result = sqlx::query(
        r#"UPDATE role_config
           SET role = ?, leader_host = ?, leader_port = ?, api_key = ?,
               sync_interval_secs = ?, connected = ?, last_connected_at = ?,
               last_applied_digest = ?, version = version + 1
           WHERE id = 1 AND version = ?"#,
    )
    .bind(next.role.as_str())
    .bind(&next.leader_host)
    .bind(next.leader_port.map(i64::from))
    .bind(&next.api_key)
    .bind(i64::from(next.sync_interval_secs))
    .bind(next.connected)
    .bind(next.last_connected_at.map(to_millis))
    .bind(&next.last_applied_digest)
    .bind(next.version)
    .execute(pool)
    .await
    .map_err(map_sqlx_err)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict { expected_version: next.version });
    }

    load_role_impl(pool).await
}
