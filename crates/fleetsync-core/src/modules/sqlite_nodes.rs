use chrono::{DateTime, Utc};
use fleetsync_types::{NodeIdentity, NodeStatus};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::modules::repository::{NewNode, RepoResult, RepositoryError};
use crate::modules::sqlite_helpers::{
    get, is_unique_violation, map_sqlx_err, row_to_node, to_millis,
};

const NODE_COLUMNS: &str = "id, name, host, port, sync_enabled, sync_interval_secs, status, \
                            last_seen, last_known_digest, created_at";

pub async fn insert_node_impl(pool: &SqlitePool, node: NewNode) -> RepoResult<NodeIdentity> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"INSERT INTO nodes (id, name, host, port, api_key_hash, sync_enabled,
                              sync_interval_secs, status, created_at)
           VALUES (?, ?, ?, ?, ?, 1, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&node.name)
    .bind(&node.host)
    .bind(i64::from(node.port))
    .bind(&node.api_key_hash)
    .bind(i64::from(node.sync_interval_secs))
    .bind(NodeStatus::Offline.as_str())
    .bind(to_millis(now))
    .execute(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            RepositoryError::AlreadyExists(node.name.clone())
        } else {
            map_sqlx_err(e)
        }
    })?;

    get_node_impl(pool, &id).await
}

pub async fn list_nodes_impl(pool: &SqlitePool) -> RepoResult<Vec<NodeIdentity>> {
    let rows = sqlx::query(&format!("SELECT {NODE_COLUMNS} FROM nodes ORDER BY name"))
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_err)?;

    rows.iter().map(row_to_node).collect()
}

pub async fn get_node_impl(pool: &SqlitePool, id: &str) -> RepoResult<NodeIdentity> {
    let row = sqlx::query(&format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

    row_to_node(&row)
}

pub async fn find_by_key_hash_impl(
    pool: &SqlitePool,
    key_hash: &str,
) -> RepoResult<Option<(NodeIdentity, String)>> {
    let row = sqlx::query(&format!(
        "SELECT {NODE_COLUMNS}, api_key_hash FROM nodes WHERE api_key_hash = ?"
    ))
    .bind(key_hash)
    .fetch_optional(pool)
    .await
    .map_err(map_sqlx_err)?;

    match row {
        Some(row) => Ok(Some((row_to_node(&row)?, get(&row, "api_key_hash")?))),
        None => Ok(None),
    }
}

pub async fn delete_node_impl(pool: &SqlitePool, id: &str) -> RepoResult<()> {
    let result = sqlx::query("DELETE FROM nodes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(map_sqlx_err)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(id.to_string()));
    }
    Ok(())
}

pub async fn set_sync_enabled_impl(
    pool: &SqlitePool,
    id: &str,
    enabled: bool,
) -> RepoResult<NodeIdentity> {
    let result = sqlx::query("UPDATE nodes SET sync_enabled = ? WHERE id = ?")
        .bind(enabled)
        .bind(id)
        .execute(pool)
        .await
        .map_err(map_sqlx_err)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(id.to_string()));
    }
    get_node_impl(pool, id).await
}

pub async fn record_contact_impl(
    pool: &SqlitePool,
    id: &str,
    digest: &str,
    at: DateTime<Utc>,
) -> RepoResult<()> {
    let result = sqlx::query(
        "UPDATE nodes SET status = ?, last_seen = ?, last_known_digest = ? WHERE id = ?",
    )
    .bind(NodeStatus::Online.as_str())
    .bind(to_millis(at))
    .bind(digest)
    .bind(id)
    .execute(pool)
    .await
    .map_err(map_sqlx_err)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(id.to_string()));
    }
    Ok(())
}

pub async fn mark_stale_impl(
    pool: &SqlitePool,
    now: DateTime<Utc>,
    multiplier: u32,
) -> RepoResult<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r#"UPDATE nodes SET status = ?
           WHERE status = ?
             AND (last_seen IS NULL OR ? - last_seen > sync_interval_secs * ? * 1000)
           RETURNING name"#,
    )
    .bind(NodeStatus::Offline.as_str())
    .bind(NodeStatus::Online.as_str())
    .bind(to_millis(now))
    .bind(i64::from(multiplier))
    .fetch_all(pool)
    .await
    .map_err(map_sqlx_err)
}
