use std::fs;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

const DATA_DIR: &str = ".fleetsync";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "FLEETSYNC_DATA_DIR";

/// Get data directory path, creating it when missing.
///
/// Priority:
/// 1. `FLEETSYNC_DATA_DIR` environment variable (for container deployments)
/// 2. `~/.fleetsync`
pub fn get_data_dir() -> AppResult<PathBuf> {
    let data_dir = if let Ok(custom_dir) = std::env::var(DATA_DIR_ENV) {
        PathBuf::from(custom_dir)
    } else {
        let home = dirs::home_dir()
            .ok_or_else(|| AppError::Config("cannot resolve home directory".to_string()))?;
        home.join(DATA_DIR)
    };

    ensure_dir(data_dir)
}

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_dir(dir: PathBuf) -> AppResult<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// Default SQLite URL inside `data_dir`.
pub fn default_database_url(data_dir: &std::path::Path) -> String {
    format!("sqlite://{}", data_dir.join("fleetsync.db").display())
}
