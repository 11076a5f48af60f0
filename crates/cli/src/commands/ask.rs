//! `sitechat ask` — Run one message through the chat pipeline.

use sitechat_chat::{ChatPipeline, ChatRequest};
use sitechat_config::AppConfig;
use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    message: String,
    site: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_with(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    config.require_api_key()?;

    let provider = sitechat_providers::build_from_config(&config)?;
    let pipeline = ChatPipeline::from_config(&config, provider)?;

    let mut request = ChatRequest::new(message);
    request.site = site;

    let outcome = pipeline.handle(request).await?;

    if outcome.is_error {
        eprintln!("{}", outcome.reply);
        return Err("the provider could not answer".into());
    }

    println!("{}", outcome.reply);
    Ok(())
}
