
use anyhow::Result;
use colored::Colorize;

use fleetsync_core::modules::config as core_config;
use fleetsync_core::{ConnectRequest, LeaderClient};
use fleetsync_types::{NodeRole, RoleConfig};

use crate::commands::Context;

fn print_role(cfg: &RoleConfig) {
    let role = match cfg.role {
        NodeRole::Leader => "leader".cyan().bold(),
        NodeRole::Follower => "follower".magenta().bold(),
    };
    println!("{} {}", "Role:".bold(), role);

    if cfg.role == NodeRole::Follower {
        let leader = cfg.leader_base_url().unwrap_or_else(|| "-".to_string());
        let connected = if cfg.connected { "yes".green() } else { "no".yellow() };
        println!("  Leader: {}", leader);
        println!("  Connected: {}", connected);
        println!("  Credential: {}", if cfg.has_credential() { "held" } else { "none" });
        println!("  Interval: {}s", cfg.sync_interval_secs);
        println!(
            "  Last connected: {}",
            cfg.last_connected_at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string())
        );
        println!("  Last applied: {}", cfg.last_applied_digest.as_deref().unwrap_or("-"));
    }
}

pub async fn show_role(ctx: &Context, json: bool) -> Result<()> {
    let cfg = ctx.engine().await?.roles().current().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
    } else {
        print_role(&cfg);
    }
    Ok(())
}

pub async fn become_leader(ctx: &Context) -> Result<()> {
    let cfg = ctx.engine().await?.roles().become_leader().await?;
    println!("{} Now acting as leader", "✓".green());
    print_role(&cfg);
    Ok(())
}

pub async fn become_follower(ctx: &Context) -> Result<()> {
    let cfg = ctx.engine().await?.roles().become_follower().await?;
    println!("{} Now acting as follower (run `fleetsync role connect` next)", "✓".green());
    print_role(&cfg);
    Ok(())
}

pub async fn connect(
    ctx: &Context,
    host: String,
    port: u16,
    api_key: String,
    interval: Option<u32>,
) -> Result<()> {
    let config = core_config::load_config(&ctx.data_dir)?;
    let client = LeaderClient::new(config.pull_timeout())?;
    let engine = ctx.engine().await?;

    let request = ConnectRequest { host, port, api_key, sync_interval_secs: interval };
    let (cfg, test) = engine.roles().connect_to_leader(request, &client).await?;

    println!(
        "{} {} ({} ms)",
        "✓".green(),
        test.message,
        test.latency_ms.map_or_else(|| "-".to_string(), |ms| ms.to_string())
    );
    print_role(&cfg);
    Ok(())
}

pub async fn disconnect(ctx: &Context) -> Result<()> {
    let cfg = ctx.engine().await?.roles().disconnect_from_leader().await?;
    println!("{} Disconnected from leader", "✓".green());
    print_role(&cfg);
    Ok(())
}
