use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::models::AppConfig;

const DATA_DIR: &str = ".creative_studio";
const CONFIG_FILE: &str = "config.json";

/// Default data directory under the user's home
pub fn get_data_dir() -> AppResult<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AppError::Config("Failed to get user home directory".to_string()))?;
    let data_dir = home.join(DATA_DIR);

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}

/// Load application config, defaults when the file does not exist yet
pub fn load_app_config(data_dir: &Path) -> AppResult<AppConfig> {
    let config_path = data_dir.join(CONFIG_FILE);

    if !config_path.exists() {
        return Ok(AppConfig::new());
    }

    let content = fs::read_to_string(&config_path)?;

    serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))
}

/// Like `load_app_config`, but writes the defaults out on first run so they can be edited
pub fn load_or_init_app_config(data_dir: &Path) -> AppResult<AppConfig> {
    if data_dir.join(CONFIG_FILE).exists() {
        return load_app_config(data_dir);
    }
    let config = AppConfig::new();
    save_app_config(data_dir, &config)?;
    tracing::info!("Wrote default config to {:?}", data_dir.join(CONFIG_FILE));
    Ok(config)
}

pub fn save_app_config(data_dir: &Path, config: &AppConfig) -> AppResult<()> {
    if !data_dir.exists() {
        fs::create_dir_all(data_dir)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(data_dir.join(CONFIG_FILE), content)?;
    Ok(())
}
