use serde::{Deserialize, Serialize};

use super::role::Role;
use super::tool::ToolCall;
use crate::errors::AgentResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
/// A single entry in a conversation
pub enum Message {
    System {
        text: String,
    },
    User {
        text: String,
    },
    Assistant {
        text: String,
        #[serde(default, rename = "toolCalls")]
        tool_calls: Vec<ToolCall>,
    },
    /// The outcome of one tool call. A failed call carries its error instead of a result,
    /// which is how per-call failures are reported without aborting the run.
    Tool {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        output: AgentResult<String>,
    },
}

impl Message {
    pub fn system<S: Into<String>>(text: S) -> Self {
        Message::System { text: text.into() }
    }

    pub fn user<S: Into<String>>(text: S) -> Self {
        Message::User { text: text.into() }
    }

    pub fn assistant<S: Into<String>>(text: S) -> Self {
        Message::Assistant {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool<S: Into<String>>(tool_call_id: S, output: AgentResult<String>) -> Self {
        Message::Tool {
            tool_call_id: tool_call_id.into(),
            output,
        }
    }

    /// Add a tool call to an assistant message; other variants are returned unchanged
    pub fn with_tool_call(mut self, call: ToolCall) -> Self {
        if let Message::Assistant { tool_calls, .. } = &mut self {
            tool_calls.push(call);
        }
        self
    }

    pub fn role(&self) -> Role {
        match self {
            Message::System { .. } => Role::System,
            Message::User { .. } => Role::User,
            Message::Assistant { .. } => Role::Assistant,
            Message::Tool { .. } => Role::Tool,
        }
    }

    /// The text used when rendering a transcript. Failed tool calls render as their error.
    pub fn text(&self) -> String {
        match self {
            Message::System { text } | Message::User { text } | Message::Assistant { text, .. } => {
                text.clone()
            }
            Message::Tool { output, .. } => match output {
                Ok(result) => result.clone(),
                Err(err) => format!("Error: {}", err),
            },
        }
    }

    /// Tool calls proposed by this message, empty for anything but an assistant turn
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Message::User { .. })
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self, Message::Assistant { .. })
    }
}
