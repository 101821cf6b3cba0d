use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::ProviderResult;
use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::tool::Tool;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// Base trait for model providers (OpenAI, Ollama, etc)
///
/// Providers are stateless per call, so one instance can be shared by concurrent runs.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next assistant message for `messages`, offering `tools` to the model.
    ///
    /// The history must satisfy [`check_history`]; the returned message is always
    /// an assistant turn.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
    ) -> ProviderResult<(Message, Usage)>;
}

/// The model is asked for the next assistant turn, so the history must not be empty
/// and must not already end in one.
pub fn check_history(messages: &[Message]) -> AgentResult<()> {
    match messages.last() {
        None => Err(AgentError::InvalidHistory(
            "cannot complete an empty conversation".to_string(),
        )),
        Some(Message::Assistant { .. }) => Err(AgentError::InvalidHistory(
            "conversation already ends with an assistant message".to_string(),
        )),
        Some(_) => Ok(()),
    }
}
