use anyhow::{Context as _, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};

use fleetsync_core::modules::registry::RegisterNode;
use fleetsync_types::{NodeIdentity, NodeStatus};

use crate::commands::Context;

pub async fn list_nodes(ctx: &Context, json: bool) -> Result<()> {
    let engine = ctx.engine().await?;
    engine.roles().require_leader().await?;
    let nodes = engine.registry().list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&nodes)?);
        return Ok(());
    }

    if nodes.is_empty() {
        println!("{}", "No nodes registered.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Name", "ID", "Address", "Status", "Sync", "Last Seen", "Digest"]);

    for node in &nodes {
        let status = match node.status {
            NodeStatus::Online => Cell::new("online").fg(Color::Green),
            NodeStatus::Syncing => Cell::new("syncing").fg(Color::Cyan),
            NodeStatus::Offline => Cell::new("offline").fg(Color::DarkGrey),
            NodeStatus::Error => Cell::new("error").fg(Color::Red),
        };
        let sync = if node.sync_enabled {
            Cell::new(format!("every {}s", node.sync_interval_secs))
        } else {
            Cell::new("disabled").fg(Color::Yellow)
        };

        table.add_row(vec![
            Cell::new(&node.name),
            Cell::new(&node.id),
            Cell::new(node.address()),
            status,
            sync,
            Cell::new(
                node.last_seen
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(node.last_known_digest.as_deref().map(short_digest).unwrap_or("-")),
        ]);
    }

    println!("{table}");
    println!("\n{} nodes total", nodes.len());
    Ok(())
}

pub async fn register_node(
    ctx: &Context,
    name: String,
    host: String,
    port: u16,
    interval: Option<u32>,
) -> Result<()> {
    let engine = ctx.engine().await?;
    engine.roles().require_leader().await?;

    let registered = engine
        .registry()
        .register(RegisterNode { name, host, port, sync_interval_secs: interval })
        .await?;

    println!("{} Registered node {} ({})", "✓".green(), registered.name.bold(), registered.id);
    println!("  API key: {}", registered.api_key.yellow());
    println!("  {}", "This key is shown once. Configure the follower with it now.".dimmed());
    Ok(())
}

pub async fn remove_node(ctx: &Context, identifier: &str) -> Result<()> {
    let engine = ctx.engine().await?;
    engine.roles().require_leader().await?;
    let node = find_node(&engine.registry().list().await?, identifier)?;

    engine.registry().delete(&node.id).await?;
    println!("{} Removed node {}", "✓".green(), node.name);
    Ok(())
}

pub async fn toggle_sync(ctx: &Context, identifier: &str, enable: bool, disable: bool) -> Result<()> {
    if enable == disable {
        anyhow::bail!("Specify exactly one of --enable or --disable");
    }

    let engine = ctx.engine().await?;
    engine.roles().require_leader().await?;
    let node = find_node(&engine.registry().list().await?, identifier)?;

    let updated = engine.registry().set_sync_enabled(&node.id, enable).await?;
    let state = if updated.sync_enabled { "enabled".green() } else { "disabled".yellow() };
    println!("{} Sync {} for {}", "✓".green(), state, updated.name);
    Ok(())
}

fn find_node(nodes: &[NodeIdentity], identifier: &str) -> Result<NodeIdentity> {
    nodes
        .iter()
        .find(|n| n.id == identifier || n.name == identifier)
        .cloned()
        .with_context(|| format!("Node not found: {identifier}"))
}

fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}
