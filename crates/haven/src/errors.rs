use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::errors::ProviderError;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Invalid tool name: {0}")]
    InvalidToolName(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Model returned an invalid response: {0}")]
    ModelResponseInvalid(String),

    #[error("Invalid conversation history: {0}")]
    InvalidHistory(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    /// Errors raised at the model boundary abort a run; everything else is either
    /// recovered per tool call or indicates a programming error.
    pub fn is_model_failure(&self) -> bool {
        matches!(
            self,
            AgentError::ModelUnavailable(_) | AgentError::ModelResponseInvalid(_)
        )
    }
}

impl From<ProviderError> for AgentError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(msg) => AgentError::ModelUnavailable(msg),
            ProviderError::ResponseInvalid(msg) => AgentError::ModelResponseInvalid(msg),
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
