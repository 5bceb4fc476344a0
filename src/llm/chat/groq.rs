use async_trait::async_trait;
use hyper::ext::ReasonPhrase;
use log::{ debug, error };
use reqwest::Client as HttpClient;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::error::Error as StdError;

use super::ChatClient;
use crate::llm::{ AssistantError, LlmConfig };
use crate::models::chat::ChatMessage;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 1.0;
const MAX_TOKENS: u32 = 1024;

pub struct GroqChatClient {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct GroqRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

impl GroqChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut builder = HttpClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self {
            http,
            api_key,
            model: chat_model,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config
            .credential()
            .ok_or_else(|| "Groq API key is required".to_string())?;

        Self::new(
            api_key.to_string(),
            config.completion_model.clone(),
            config.base_url.clone(),
            config.request_timeout,
        )
    }
}

/// Pulls `choices[0].message.content` out of an untrusted response body.
fn extract_content(body: &str) -> Result<String, AssistantError> {
    let parsed: JsonValue = serde_json::from_str(body).map_err(|e| {
        debug!("Groq response is not JSON: {}", e);
        AssistantError::MalformedResponse
    })?;

    parsed
        .get("choices")
        .and_then(JsonValue::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(JsonValue::as_str)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
        .ok_or(AssistantError::MalformedResponse)
}

#[async_trait]
impl ChatClient for GroqChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AssistantError> {
        let req = GroqRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            top_p: TOP_P,
            stream: false,
        };

        debug!("Sending {} message(s) to {}", messages.len(), self.base_url);

        // `json` sets Content-Type: application/json.
        let resp = self.http
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let reason = resp
                .extensions()
                .get::<ReasonPhrase>()
                .and_then(|phrase| std::str::from_utf8(phrase.as_bytes()).ok())
                .map(str::to_string);
            let error_body = resp.text().await.unwrap_or_default();
            error!("Groq API Error: {} {}", status, error_body);
            return Err(AssistantError::from_status(status, reason.as_deref()));
        }

        let body = resp.text().await?;
        extract_content(&body)
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }
}
