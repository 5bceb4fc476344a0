pub mod assistant;
pub mod models;
pub mod server;
pub mod config;
pub mod llm;
pub mod cli;

use assistant::Assistant;
use cli::Args;
use config::prompt::load_prompts;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let llm_config = args.llm_config();

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Groq API Key: {}", if llm_config.credential().is_some() { "set" } else { "not set" });
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Chat Base URL: {}", args.chat_base_url.as_deref().unwrap_or("adapter default"));
    info!("Chat Timeout (s): {}", args.chat_timeout_secs.map_or("none".to_string(), |s| s.to_string()));
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("Rate Limit (req/s): {}", args.rate_limit_per_second);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let mut assistant = Assistant::new(&llm_config)?;
    if let Some(path) = &args.prompts_path {
        let prompts = load_prompts(path)
            .map_err(|e| format!("Failed to load prompts file '{}': {}", path, e))?;
        assistant = assistant.with_prompts(prompts);
    }

    let addr = args.server_addr.clone();
    let server = Server::new(addr, Arc::new(assistant), args);
    server.run().await?;

    Ok(())
}
