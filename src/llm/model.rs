//! Model collaborator: a text-completion backend for SQL generation.
//!
//! The default backend speaks the OpenAI chat-completions protocol through
//! `async-openai`, which covers Bedrock's OpenAI-compatible runtime endpoint
//! as well as local proxies.

use crate::error::{GatewayError, GatewayResult};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Sends one prompt, returns the model's text.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> GatewayResult<String>;
}

/// Endpoint and sampling parameters for [`ChatCompletionModel`].
#[derive(Clone)]
pub struct ModelSettings {
    /// OpenAI-compatible API base, e.g. `https://bedrock-runtime.us-east-1.amazonaws.com/openai/v1`
    pub base_url: String,
    pub api_key: String,
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl std::fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "****" })
            .field("model_id", &self.model_id)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Chat-completions backend. A fresh HTTP client is built for every call.
#[derive(Debug, Clone)]
pub struct ChatCompletionModel {
    settings: ModelSettings,
}

impl ChatCompletionModel {
    pub fn new(settings: ModelSettings) -> Self {
        Self { settings }
    }

    fn client(&self) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_key(&self.settings.api_key)
            .with_api_base(&self.settings.base_url);
        Client::with_config(config)
    }

    fn build_request(&self, prompt: &str) -> CreateChatCompletionRequest {
        CreateChatCompletionRequest {
            model: self.settings.model_id.clone(),
            messages: vec![ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
                    name: None,
                },
            )],
            temperature: Some(self.settings.temperature),
            max_completion_tokens: Some(self.settings.max_tokens),
            ..Default::default()
        }
    }
}

fn map_openai_error(err: OpenAIError) -> GatewayError {
    match err {
        OpenAIError::Reqwest(e) => GatewayError::connectivity(
            format!("Model endpoint unreachable: {}", e),
            "Check MODEL_BASE_URL, AWS_REGION and network access to the model endpoint",
        ),
        other => GatewayError::generation(format!("Model request failed: {}", other)),
    }
}

#[async_trait]
impl CompletionModel for ChatCompletionModel {
    fn name(&self) -> &'static str {
        "chat-completions"
    }

    async fn complete(&self, prompt: &str) -> GatewayResult<String> {
        let start = Instant::now();
        let client = self.client();
        let request = self.build_request(prompt);
        debug!(
            model = %self.settings.model_id,
            prompt_chars = prompt.len(),
            "Sending completion request"
        );

        let response = tokio::time::timeout(self.settings.timeout, client.chat().create(request))
            .await
            .map_err(|_| {
                GatewayError::generation(format!(
                    "Model did not respond within {}s",
                    self.settings.timeout.as_secs()
                ))
            })?
            .map_err(map_openai_error)?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GatewayError::generation(
                "No SQL query generated: the model returned no text",
            ));
        }

        info!(
            model = %self.settings.model_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Model completion received"
        );
        Ok(text)
    }
}
