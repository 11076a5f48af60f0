//! `sitechat resolve` — Show what a chat request for a site would be grounded on.
//!
//! Needs no API key; the provider is never called.

use sitechat_chat::PromptComposer;
use sitechat_config::AppConfig;
use sitechat_core::SiteId;
use std::path::Path;

pub async fn run(config_path: Option<&Path>, site: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_with(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    let site = SiteId::parse_optional(site.as_deref())?;
    let resolver = sitechat_knowledge::build_from_config(&config.knowledge)?;
    let composer = PromptComposer::new(&config.chat.assistant_name);

    let knowledge = resolver.resolve(site.as_ref()).await;
    let prompt = composer.compose(&knowledge, site.as_ref());

    println!("Site:    {}", site.as_ref().map_or("(none)", SiteId::as_str));
    println!("Sources: {:?}", resolver.kinds());
    println!("Source:  {}", knowledge.source);
    println!("Bytes:   {}", knowledge.text.len());
    println!();
    println!("{prompt}");

    Ok(())
}
