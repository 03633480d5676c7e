use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use colored::Colorize;

use fleetsync_core::modules::config as core_config;
use fleetsync_core::utils::paths;
use fleetsync_core::{SqliteStore, SyncEngine};

use crate::cli::{Cli, ConfigCommands, NodeCommands, RoleCommands};

mod config_commands_impl {
    pub use crate::config_commands::*;
}
mod node_commands_impl {
    pub use crate::node_commands::*;
}
mod role_commands_impl {
    pub use crate::role_commands::*;
}

/// Resolved locations shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub data_dir: PathBuf,
    pub database_url: String,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let data_dir = match &cli.data_dir {
            Some(dir) => paths::ensure_dir(dir.clone())?,
            None => paths::get_data_dir()?,
        };
        let database_url =
            cli.database_url.clone().unwrap_or_else(|| paths::default_database_url(&data_dir));
        Ok(Self { data_dir, database_url })
    }

    /// Open the database and bring the schema up to date.
    pub async fn open_store(&self) -> Result<Arc<SqliteStore>> {
        let store = SqliteStore::connect(&self.database_url)
            .await
            .with_context(|| format!("Failed to open database {}", self.database_url))?;
        store.run_migrations().await.context("Failed to run database migrations")?;
        Ok(Arc::new(store))
    }

    pub async fn engine(&self) -> Result<SyncEngine> {
        Ok(SyncEngine::from_store(self.open_store().await?))
    }
}

pub async fn handle_node_command(ctx: &Context, cmd: NodeCommands) -> Result<()> {
    match cmd {
        NodeCommands::List { json } => node_commands_impl::list_nodes(ctx, json).await,
        NodeCommands::Register { name, host, node_port, interval } => {
            node_commands_impl::register_node(ctx, name, host, node_port, interval).await
        },
        NodeCommands::Remove { identifier } => {
            node_commands_impl::remove_node(ctx, &identifier).await
        },
        NodeCommands::Sync { identifier, enable, disable } => {
            node_commands_impl::toggle_sync(ctx, &identifier, enable, disable).await
        },
    }
}

pub async fn handle_role_command(ctx: &Context, cmd: RoleCommands) -> Result<()> {
    match cmd {
        RoleCommands::Show { json } => role_commands_impl::show_role(ctx, json).await,
        RoleCommands::Leader => role_commands_impl::become_leader(ctx).await,
        RoleCommands::Follower => role_commands_impl::become_follower(ctx).await,
        RoleCommands::Connect { leader_host, leader_port, api_key, interval } => {
            role_commands_impl::connect(ctx, leader_host, leader_port, api_key, interval).await
        },
        RoleCommands::Disconnect => role_commands_impl::disconnect(ctx).await,
    }
}

pub fn handle_config_command(ctx: &Context, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show { json } => config_commands_impl::show_config(ctx, json),
        ConfigCommands::Set { key, value } => {
            config_commands_impl::set_config_value(ctx, &key, &value)
        },
    }
}

pub async fn handle_digest(ctx: &Context, json: bool) -> Result<()> {
    let report = ctx.engine().await?.report_local_digest().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", "Local Configuration Digest".cyan().bold());
        println!("  Role: {}", report.role);
        println!("  Digest: {}", report.hash);
        match &report.last_applied_digest {
            Some(applied) if *applied == report.hash => {
                println!("  Last applied: {} {}", applied, "(in sync)".green());
            },
            Some(applied) => println!("  Last applied: {} {}", applied, "(diverged)".yellow()),
            None => println!("  Last applied: -"),
        }
    }
    Ok(())
}

pub fn handle_generate_token(ctx: &Context) -> Result<()> {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);

    core_config::update_config(&ctx.data_dir, |config| {
        config.admin_token = token.clone();
    })?;

    println!("{} New admin token generated: {}", "✓".green(), token);
    Ok(())
}
