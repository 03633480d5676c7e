//! SQLite persistence for the synchronizable proxy configuration.
//!
//! Reads and writes take a `&mut SqliteConnection` so the same helpers run
//! against the pool or inside a transaction (`&mut *tx`).

use std::collections::BTreeMap;

use chrono::Utc;
use fleetsync_types::{
    AccessRule, Category, CategoryCounts, Certificate, DomainConfig, NodeRole, Snapshot,
    UserAccount, WafRule,
};
use sqlx::sqlite::{SqliteConnection, SqlitePool};

use crate::modules::reconcile::ReconcilePlan;
use crate::modules::repository::{ImportFence, RepoResult, RepositoryError};
use crate::modules::sqlite_helpers::{
    decode_enum, decode_json, encode_enum, encode_json, get, map_sqlx_err, to_millis,
};

// ---- reads ----

async fn read_domains(conn: &mut SqliteConnection) -> RepoResult<Vec<DomainConfig>> {
    let rows = sqlx::query(
        "SELECT domain, backends, lb_policy, ssl_enabled, certificate, waf_enabled FROM domains",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(map_sqlx_err)?;

    rows.iter()
        .map(|row| {
            let backends: String = get(row, "backends")?;
            let lb_policy: String = get(row, "lb_policy")?;
            Ok(DomainConfig {
                domain: get(row, "domain")?,
                backends: decode_json(&backends)?,
                lb_policy: decode_enum(&lb_policy)?,
                ssl_enabled: get(row, "ssl_enabled")?,
                certificate: get(row, "certificate")?,
                waf_enabled: get(row, "waf_enabled")?,
            })
        })
        .collect()
}

async fn read_certificates(conn: &mut SqliteConnection) -> RepoResult<Vec<Certificate>> {
    let rows =
        sqlx::query("SELECT name, domains, cert_pem, key_pem, auto_renew FROM certificates")
            .fetch_all(&mut *conn)
            .await
            .map_err(map_sqlx_err)?;

    rows.iter()
        .map(|row| {
            let domains: String = get(row, "domains")?;
            Ok(Certificate {
                name: get(row, "name")?,
                domains: decode_json(&domains)?,
                cert_pem: get(row, "cert_pem")?,
                key_pem: get(row, "key_pem")?,
                auto_renew: get(row, "auto_renew")?,
            })
        })
        .collect()
}

async fn read_waf_rules(conn: &mut SqliteConnection) -> RepoResult<Vec<WafRule>> {
    let rows = sqlx::query("SELECT rule_file, kind, content, enabled FROM waf_rules")
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_err)?;

    rows.iter()
        .map(|row| {
            let kind: String = get(row, "kind")?;
            Ok(WafRule {
                rule_file: get(row, "rule_file")?,
                kind: decode_enum(&kind)?,
                content: get(row, "content")?,
                enabled: get(row, "enabled")?,
            })
        })
        .collect()
}

async fn read_access_rules(conn: &mut SqliteConnection) -> RepoResult<Vec<AccessRule>> {
    let rows = sqlx::query("SELECT name, action, cidr, domain, priority FROM access_rules")
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_err)?;

    rows.iter()
        .map(|row| {
            let action: String = get(row, "action")?;
            Ok(AccessRule {
                name: get(row, "name")?,
                action: decode_enum(&action)?,
                cidr: get(row, "cidr")?,
                domain: get(row, "domain")?,
                priority: get(row, "priority")?,
            })
        })
        .collect()
}

async fn read_users(conn: &mut SqliteConnection) -> RepoResult<Vec<UserAccount>> {
    let rows = sqlx::query("SELECT username, password_hash, role, enabled FROM users")
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_err)?;

    rows.iter()
        .map(|row| {
            Ok(UserAccount {
                username: get(row, "username")?,
                password_hash: get(row, "password_hash")?,
                role: get(row, "role")?,
                enabled: get(row, "enabled")?,
            })
        })
        .collect()
}

/// Every category from one connection, normalized.
pub(crate) async fn read_snapshot(conn: &mut SqliteConnection) -> RepoResult<Snapshot> {
    let snapshot = Snapshot {
        domains: read_domains(conn).await?,
        certificates: read_certificates(conn).await?,
        waf_rules: read_waf_rules(conn).await?,
        access_rules: read_access_rules(conn).await?,
        users: read_users(conn).await?,
    };
    Ok(snapshot.normalized())
}

// ---- writes ----

async fn upsert_domain(conn: &mut SqliteConnection, d: &DomainConfig, now: i64) -> RepoResult<()> {
    sqlx::query(
        r#"INSERT INTO domains (domain, backends, lb_policy, ssl_enabled, certificate,
                                waf_enabled, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT(domain) DO UPDATE SET
               backends = excluded.backends, lb_policy = excluded.lb_policy,
               ssl_enabled = excluded.ssl_enabled, certificate = excluded.certificate,
               waf_enabled = excluded.waf_enabled, updated_at = excluded.updated_at"#,
    )
    .bind(&d.domain)
    .bind(encode_json(&d.backends)?)
    .bind(encode_enum(&d.lb_policy)?)
    .bind(d.ssl_enabled)
    .bind(&d.certificate)
    .bind(d.waf_enabled)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_err)?;
    Ok(())
}

async fn upsert_certificate(
    conn: &mut SqliteConnection,
    c: &Certificate,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        r#"INSERT INTO certificates (name, domains, cert_pem, key_pem, auto_renew,
                                     created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT(name) DO UPDATE SET
               domains = excluded.domains, cert_pem = excluded.cert_pem,
               key_pem = excluded.key_pem, auto_renew = excluded.auto_renew,
               updated_at = excluded.updated_at"#,
    )
    .bind(&c.name)
    .bind(encode_json(&c.domains)?)
    .bind(&c.cert_pem)
    .bind(&c.key_pem)
    .bind(c.auto_renew)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_err)?;
    Ok(())
}

async fn upsert_waf_rule(conn: &mut SqliteConnection, w: &WafRule, now: i64) -> RepoResult<()> {
    sqlx::query(
        r#"INSERT INTO waf_rules (rule_file, kind, content, enabled, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?)
           ON CONFLICT(rule_file) DO UPDATE SET
               kind = excluded.kind, content = excluded.content,
               enabled = excluded.enabled, updated_at = excluded.updated_at"#,
    )
    .bind(&w.rule_file)
    .bind(encode_enum(&w.kind)?)
    .bind(&w.content)
    .bind(w.enabled)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_err)?;
    Ok(())
}

async fn upsert_access_rule(
    conn: &mut SqliteConnection,
    a: &AccessRule,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        r#"INSERT INTO access_rules (name, action, cidr, domain, priority, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT(name) DO UPDATE SET
               action = excluded.action, cidr = excluded.cidr, domain = excluded.domain,
               priority = excluded.priority, updated_at = excluded.updated_at"#,
    )
    .bind(&a.name)
    .bind(encode_enum(&a.action)?)
    .bind(&a.cidr)
    .bind(&a.domain)
    .bind(a.priority)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_err)?;
    Ok(())
}

async fn upsert_user(conn: &mut SqliteConnection, u: &UserAccount, now: i64) -> RepoResult<()> {
    sqlx::query(
        r#"INSERT INTO users (username, password_hash, role, enabled, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?)
           ON CONFLICT(username) DO UPDATE SET
               password_hash = excluded.password_hash, role = excluded.role,
               enabled = excluded.enabled, updated_at = excluded.updated_at"#,
    )
    .bind(&u.username)
    .bind(&u.password_hash)
    .bind(&u.role)
    .bind(u.enabled)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_err)?;
    Ok(())
}

async fn write_entities<'a>(
    conn: &mut SqliteConnection,
    domains: impl Iterator<Item = &'a DomainConfig>,
    certificates: impl Iterator<Item = &'a Certificate>,
    waf_rules: impl Iterator<Item = &'a WafRule>,
    access_rules: impl Iterator<Item = &'a AccessRule>,
    users: impl Iterator<Item = &'a UserAccount>,
) -> RepoResult<()> {
    let now = to_millis(Utc::now());
    for d in domains {
        upsert_domain(conn, d, now).await?;
    }
    for c in certificates {
        upsert_certificate(conn, c, now).await?;
    }
    for w in waf_rules {
        upsert_waf_rule(conn, w, now).await?;
    }
    for a in access_rules {
        upsert_access_rule(conn, a, now).await?;
    }
    for u in users {
        upsert_user(conn, u, now).await?;
    }
    Ok(())
}

// ---- repository entry points ----

pub async fn load_snapshot_impl(pool: &SqlitePool) -> RepoResult<Snapshot> {
    let mut tx = pool.begin().await.map_err(map_sqlx_err)?;
    let snapshot = read_snapshot(&mut *tx).await?;
    tx.commit().await.map_err(map_sqlx_err)?;
    Ok(snapshot)
}

pub async fn save_entities_impl(pool: &SqlitePool, entities: &Snapshot) -> RepoResult<()> {
    let entities = entities.clone().normalized();
    let mut tx = pool.begin().await.map_err(map_sqlx_err)?;
    write_entities(
        &mut *tx,
        entities.domains.iter(),
        entities.certificates.iter(),
        entities.waf_rules.iter(),
        entities.access_rules.iter(),
        entities.users.iter(),
    )
    .await?;
    tx.commit().await.map_err(map_sqlx_err)
}

pub async fn apply_snapshot_impl(
    pool: &SqlitePool,
    incoming: &Snapshot,
    fence: &ImportFence,
) -> RepoResult<BTreeMap<Category, CategoryCounts>> {
    let incoming = incoming.clone().normalized();
    let mut tx = pool.begin().await.map_err(map_sqlx_err)?;

    let local = read_snapshot(&mut *tx).await?;
    let plan = ReconcilePlan::between(&local, &incoming);

    write_entities(
        &mut *tx,
        plan.domains.writes(),
        plan.certificates.writes(),
        plan.waf_rules.writes(),
        plan.access_rules.writes(),
        plan.users.writes(),
    )
    .await?;

    let stamped = sqlx::query(
        r#"UPDATE role_config
           SET last_connected_at = ?, last_applied_digest = ?, version = version + 1
           WHERE id = 1 AND version = ? AND role = ?"#,
    )
    .bind(to_millis(fence.applied_at))
    .bind(&fence.digest)
    .bind(fence.expected_version)
    .bind(NodeRole::Follower.as_str())
    .execute(&mut *tx)
    .await
    .map_err(map_sqlx_err)?;

    if stamped.rows_affected() == 0 {
        // Dropping `tx` rolls back every entity write above.
        return Err(RepositoryError::Conflict { expected_version: fence.expected_version });
    }

    tx.commit().await.map_err(map_sqlx_err)?;
    Ok(plan.counts())
}
