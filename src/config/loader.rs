// Configuration loader
// Reads agent.toml; the API key may come from the environment instead.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::settings::Config;

/// Environment variables consulted (in order) when `[oracle] api_key`
/// is absent from the file.
const API_KEY_ENV_VARS: &[&str] = &["MEND_API_KEY", "OPENAI_API_KEY"];

/// Load and validate configuration from the given agent.toml path.
pub fn load_config(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    if config.oracle.api_key.trim().is_empty() {
        for var in API_KEY_ENV_VARS {
            if let Ok(key) = std::env::var(var) {
                if !key.trim().is_empty() {
                    config.oracle.api_key = key;
                    break;
                }
            }
        }
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}
