use std::collections::HashSet;

use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;

/// The ordered message history of one run.
///
/// Messages can only be appended. A tool message is accepted only when an earlier
/// assistant turn proposed the tool call it answers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
    proposed: HashSet<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a conversation from an existing history, checking every message in order
    pub fn from_messages(messages: Vec<Message>) -> AgentResult<Self> {
        let mut conversation = Self::new();
        for message in messages {
            conversation.push(message)?;
        }
        Ok(conversation)
    }

    /// Check that a sequence of messages satisfies the history invariants
    pub fn validate(messages: &[Message]) -> AgentResult<()> {
        Self::from_messages(messages.to_vec()).map(|_| ())
    }

    pub fn push(&mut self, message: Message) -> AgentResult<()> {
        match &message {
            Message::Tool { tool_call_id, .. } if !self.proposed.contains(tool_call_id) => {
                return Err(AgentError::InvalidHistory(format!(
                    "tool message references unknown tool call id '{}'",
                    tool_call_id
                )));
            }
            Message::Assistant { tool_calls, .. } => {
                self.proposed.extend(tool_calls.iter().map(|call| call.id.clone()));
            }
            _ => {}
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The most recent assistant turn, wherever it sits in the history
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_assistant())
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
