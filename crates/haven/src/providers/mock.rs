use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::base::{Provider, Usage};
use super::errors::{ProviderError, ProviderResult};
use crate::models::message::Message;
use crate::models::tool::Tool;

/// A mock provider that returns pre-configured responses, for tests and offline runs.
///
/// Every history it is asked to complete is recorded so callers can inspect what the
/// model would have seen.
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<ProviderResult<Message>>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Message>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    /// Create a mock provider whose replies may also be failures
    pub fn with_results(responses: Vec<ProviderResult<Message>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::default(),
        }
    }

    /// The histories passed to `complete`, oldest first
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> ProviderError {
    ProviderError::Unavailable("mock provider lock poisoned".to_string())
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[Tool],
    ) -> ProviderResult<(Message, Usage)> {
        self.calls.lock().map_err(poisoned)?.push(messages.to_vec());

        let mut responses = self.responses.lock().map_err(poisoned)?;
        if responses.is_empty() {
            // Return empty response if no more pre-configured responses
            Ok((Message::assistant(""), Usage::default()))
        } else {
            responses
                .remove(0)
                .map(|message| (message, Usage::default()))
        }
    }
}
