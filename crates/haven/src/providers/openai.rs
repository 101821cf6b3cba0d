use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::base::{Provider, Usage};
use super::configs::OpenAiProviderConfig;
use super::errors::ProviderResult;
use super::utils::{create_request, get_usage, openai_response_to_message, send_request};
use crate::models::message::Message;
use crate::models::tool::Tool;

pub const OPENAI_HOST: &str = "https://api.openai.com";
pub const OPENAI_MODEL: &str = "gpt-4o";

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
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
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key));

        let response = send_request(request, &payload).await?;
        let message = openai_response_to_message(&response)?;
        let usage = get_usage(&response);
        tracing::debug!(model = %self.config.model, ?usage, "openai completion");

        Ok((message, usage))
    }
}
