//! fleetsync - Configuration Sync Daemon
//!
//! Keeps a fleet of reverse-proxy nodes on one configuration:
//! - a leader registers followers and serves its config on /api/sync/export
//! - followers pull on an interval and reconcile locally
//! - an admin REST API on /api/* drives both roles
//!
//! Access via: http://localhost:8070

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod cli;
mod commands;
mod config_commands;
mod middleware;
mod node_commands;
mod role_commands;
mod router;
mod scheduler;
mod server_utils;
mod state;

#[cfg(test)]
mod test_helpers;

use cli::{Cli, Commands};
use commands::Context;
use fleetsync_core::modules::config as core_config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let ctx = Context::from_cli(&cli)?;

    match cli.command {
        None | Some(Commands::Serve) => run_server(&ctx, &cli.host, cli.port).await,
        Some(Commands::Node(cmd)) => commands::handle_node_command(&ctx, cmd).await,
        Some(Commands::Role(cmd)) => commands::handle_role_command(&ctx, cmd).await,
        Some(Commands::Digest { json }) => commands::handle_digest(&ctx, json).await,
        Some(Commands::Config(cmd)) => commands::handle_config_command(&ctx, cmd),
        Some(Commands::GenerateToken) => commands::handle_generate_token(&ctx),
    }
}

async fn run_server(ctx: &Context, host: &str, port: u16) -> Result<()> {
    info!("🚀 fleetsync starting on {}:{}...", host, port);

    let config = core_config::load_config(&ctx.data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    let store = ctx.open_store().await?;
    let state = AppState::new(store, config)?;

    let role = state.roles().current().await?;
    info!("✅ Database ready at {} (role: {})", ctx.database_url, role.role);

    scheduler::start_follower_puller(state.clone());
    scheduler::start_stale_sweep(state.clone());

    let app = router::build_router(state);
    let listener = server_utils::create_listener(host, port).await?;

    info!("🔌 Admin API at http://{}:{}/api/", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(server_utils::shutdown_signal())
        .await?;

    info!("👋 fleetsync stopped");
    Ok(())
}
