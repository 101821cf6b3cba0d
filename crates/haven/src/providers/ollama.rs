use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::base::{Provider, Usage};
use super::configs::OllamaProviderConfig;
use super::errors::ProviderResult;
use super::utils::{create_request, get_usage, openai_response_to_message, send_request};
use crate::models::message::Message;
use crate::models::tool::Tool;

pub const OLLAMA_HOST: &str = "http://localhost:11434";
pub const OLLAMA_MODEL: &str = "qwen2.5";

/// Talks to a local Ollama server through its OpenAI compatible endpoint
pub struct OllamaProvider {
    client: Client,
    config: OllamaProviderConfig,
}

impl OllamaProvider {
    pub fn new(config: OllamaProviderConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
    ) -> ProviderResult<(Message, Usage)> {
        let payload = create_request(
            &self.config.model,
            messages,
            tools,
            self.config.temperature,
            self.config.max_tokens,
        );

        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );
        let response = send_request(self.client.post(&url), &payload).await?;
        let message = openai_response_to_message(&response)?;
        let usage = get_usage(&response);
        tracing::debug!(model = %self.config.model, ?usage, "ollama completion");

        Ok((message, usage))
    }
}
