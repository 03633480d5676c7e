use std::fs;
use std::path::Path;

use fleetsync_types::AppConfig;

use crate::error::AppResult;

pub const CONFIG_FILE: &str = "fleetsync.json";

/// Load the app config from `data_dir`, defaulting when the file is absent.
pub fn load_config(data_dir: &Path) -> AppResult<AppConfig> {
    let config_path = data_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(AppConfig::new());
    }

    let content = fs::read_to_string(&config_path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Save the app config atomically (temp file + rename).
pub fn save_config(data_dir: &Path, config: &AppConfig) -> AppResult<()> {
    let config_path = data_dir.join(CONFIG_FILE);
    let temp_path = data_dir.join(format!("{CONFIG_FILE}.tmp"));

    let content = serde_json::to_string_pretty(config)?;
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, &config_path)?;
    Ok(())
}

/// Update specific fields in the config.
pub fn update_config<F>(data_dir: &Path, updater: F) -> AppResult<AppConfig>
where
    F: FnOnce(&mut AppConfig),
{
    let mut config = load_config(data_dir)?;
    updater(&mut config);
    save_config(data_dir, &config)?;
    Ok(config)
}
