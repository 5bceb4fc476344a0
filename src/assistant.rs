use crate::config::prompt::{
    self,
    PromptConfig,
    DEFAULT_DIFFICULTY,
};
use crate::llm::{ AssistantError, LlmConfig };
use crate::llm::chat::{ ChatClient, new_client as new_chat_client };
use crate::models::chat::{ ChatMessage, ChatRole };

use log::{ debug, error };
use std::error::Error;
use std::sync::Arc;

/// NeuroNest assistant: prompt templating plus a completion call that never fails.
///
/// The credential is captured at construction and never re-read. Clones share the same
/// HTTP client and prompt set.
#[derive(Clone)]
pub struct Assistant {
    chat_client: Option<Arc<dyn ChatClient>>,
    prompt_config: Arc<PromptConfig>,
}

impl Assistant {
    pub fn new(config: &LlmConfig) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(Self {
            chat_client: new_chat_client(config)?,
            prompt_config: Arc::new(PromptConfig::default()),
        })
    }

    pub fn with_client(chat_client: Arc<dyn ChatClient>) -> Self {
        Self {
            chat_client: Some(chat_client),
            prompt_config: Arc::new(PromptConfig::default()),
        }
    }

    pub fn with_prompts(mut self, prompt_config: Arc<PromptConfig>) -> Self {
        self.prompt_config = prompt_config;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.chat_client.is_some()
    }

    pub fn model(&self) -> Option<String> {
        self.chat_client.as_ref().map(|c| c.get_model())
    }

    /// Sends `history` as-is. Every failure comes back as user-facing text.
    pub async fn converse(&self, history: &[ChatMessage]) -> String {
        let result = match &self.chat_client {
            Some(client) => client.complete(history).await,
            None => Err(AssistantError::Unconfigured),
        };

        match result {
            Ok(reply) => reply,
            Err(AssistantError::Unconfigured) => AssistantError::Unconfigured.to_string(),
            Err(e) => {
                error!("Failed to call chat completion API: {:?}", e);
                e.to_string()
            }
        }
    }

    pub async fn assist(&self, utterance: &str, context: Option<&str>) -> String {
        let messages = vec![
            ChatMessage::system(prompt::get_assist_prompt(&self.prompt_config, context)),
            ChatMessage::user(utterance),
        ];
        self.converse(&messages).await
    }

    /// Multi-turn `assist`: the system prompt is synthesized here, so any system message in
    /// `history` is dropped.
    pub async fn continue_conversation(
        &self,
        history: &[ChatMessage],
        context: Option<&str>
    ) -> String {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(prompt::get_assist_prompt(&self.prompt_config, context)));
        messages.extend(history.iter().filter(|m| m.role != ChatRole::System).cloned());
        let kept = messages.len() - 1;
        if kept < history.len() {
            debug!("Dropped {} caller-supplied system message(s)", history.len() - kept);
        }
        self.converse(&messages).await
    }

    pub async fn support_emotion(&self, emotion: &str, details: Option<&str>) -> String {
        let messages = vec![
            ChatMessage::system(prompt::get_emotional_support_prompt(&self.prompt_config, emotion)),
            ChatMessage::user(prompt::emotion_user_message(emotion, details)),
        ];
        self.converse(&messages).await
    }

    pub async fn teach(&self, topic: &str, difficulty: Option<&str>) -> String {
        let difficulty = difficulty.unwrap_or(DEFAULT_DIFFICULTY);
        let messages = vec![
            ChatMessage::system(prompt::get_learning_prompt(&self.prompt_config, topic, difficulty)),
            ChatMessage::user(prompt::learning_user_message(topic)),
        ];
        self.converse(&messages).await
    }
}
