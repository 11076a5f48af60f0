//! `sitechat config` — Show the effective configuration.

use sitechat_config::AppConfig;
use std::path::Path;

pub fn run(config_path: Option<&Path>, path_only: bool) -> Result<(), Box<dyn std::error::Error>> {
    let file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    if path_only {
        println!("{}", file.display());
        return Ok(());
    }

    let config = AppConfig::load_with(Some(&file)).map_err(|e| format!("Failed to load config: {e}"))?;

    println!("# {}", file.display());
    if config.require_api_key().is_err() {
        println!("# warning: no API key set (SITECHAT_API_KEY or OPENAI_API_KEY)");
    }
    println!("{}", config.to_redacted_toml());
    Ok(())
}
