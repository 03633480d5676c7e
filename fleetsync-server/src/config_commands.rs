use anyhow::Result;
use colored::Colorize;

use fleetsync_core::modules::config as core_config;

use crate::commands::Context;

const KEYS: &[&str] = &[
    "admin_token",
    "pull_timeout_secs",
    "backoff_base_secs",
    "backoff_max_secs",
    "stale_after_intervals",
    "stale_sweep_secs",
];

pub fn show_config(ctx: &Context, json: bool) -> Result<()> {
    let mut config = core_config::load_config(&ctx.data_dir)?;
    config.admin_token = mask_key(&config.admin_token);

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("{}", "fleetsync Configuration:".cyan().bold());
        println!("  Data dir: {}", ctx.data_dir.display());
        println!("  Database: {}", ctx.database_url);
        println!("  Admin token: {}", config.admin_token);
        println!("  Pull timeout: {}s", config.pull_timeout_secs);
        println!("  Backoff: {}s → {}s", config.backoff_base_secs, config.backoff_max_secs);
        println!(
            "  Stale after: {} intervals (sweep every {}s)",
            config.stale_after_intervals, config.stale_sweep_secs
        );
    }
    Ok(())
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value.parse().map_err(|_| anyhow::anyhow!("Invalid number for {}: {}", key, value))
}

pub fn set_config_value(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut config = core_config::load_config(&ctx.data_dir)?;

    match key {
        "admin_token" => config.admin_token = value.trim().to_string(),
        "pull_timeout_secs" => config.pull_timeout_secs = parse_u64(key, value)?.max(1),
        "backoff_base_secs" => config.backoff_base_secs = parse_u64(key, value)?.max(1),
        "backoff_max_secs" => config.backoff_max_secs = parse_u64(key, value)?,
        "stale_after_intervals" => {
            config.stale_after_intervals = value
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid number for {}: {}", key, value))?;
        },
        "stale_sweep_secs" => config.stale_sweep_secs = parse_u64(key, value)?.max(1),
        _ => anyhow::bail!("Unknown config key: {} (expected one of: {})", key, KEYS.join(", ")),
    }

    if config.backoff_max_secs < config.backoff_base_secs {
        anyhow::bail!("backoff_max_secs must be >= backoff_base_secs");
    }

    core_config::save_config(&ctx.data_dir, &config)?;
    let shown = if key == "admin_token" { mask_key(value) } else { value.to_string() };
    println!("{} Config updated: {} = {}", "✓".green(), key, shown);
    Ok(())
}

fn mask_key(key: &str) -> String {
    if key.len() <= 8 {
        return "*".repeat(key.len());
    }
    format!("{}...{}", &key[..4], &key[key.len() - 4..])
}
