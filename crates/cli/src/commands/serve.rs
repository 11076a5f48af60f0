//! `sitechat serve` — Start the HTTP server.

use sitechat_config::AppConfig;
use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
    host_override: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load_with(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    if let Some(host) = host_override {
        config.gateway.host = host;
    }

    // Refuse to start without credentials, before anything is bound.
    config.require_api_key()?;

    println!("SiteChat");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:  {} ({})", config.default_provider, config.default_model);
    println!("   Knowledge: {}", config.knowledge.dir.display());

    sitechat_gateway::start(config).await?;

    Ok(())
}
