pub mod groq;

use async_trait::async_trait;
use log::{ info, warn };
use std::error::Error as StdError;
use std::sync::Arc;

use super::{ AssistantError, LlmConfig };
use self::groq::GroqChatClient;
use crate::models::chat::ChatMessage;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends `messages` verbatim and returns the first completion's text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AssistantError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> String;
}

/// Builds the chat client for `config`, or `None` when no credential is configured.
pub fn new_client(
    config: &LlmConfig
) -> Result<Option<Arc<dyn ChatClient>>, Box<dyn StdError + Send + Sync>> {
    if config.credential().is_none() {
        warn!("GROQ_API_KEY is not set. AI features will be limited.");
        return Ok(None);
    }
    let client = GroqChatClient::from_config(config)?;
    info!(
        "Chat client configured: Model={}, BaseURL={}",
        client.get_model(),
        client.get_base_url()
    );
    Ok(Some(Arc::new(client)))
}
