use crate::agent::{Agent, RunInput};
use crate::errors::AgentResult;
use crate::models::message::Message;

/// The boundary between the HTTP layer and the agent graph.
///
/// Every call is an independent run. Tool failures are part of the returned transcript;
/// model failures are returned as errors so no partial transcript passes for a reply.
pub struct AgentService {
    agent: Agent,
}

impl AgentService {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub async fn run(&self, prompt: &str, confirmation: Option<&str>) -> AgentResult<String> {
        let mut input = RunInput::new(prompt);
        if let Some(confirmation) = confirmation {
            input = input.with_confirmation(confirmation);
        }

        tracing::info!(confirmation = confirmation.is_some(), "starting agent run");
        let run = self.agent.run(input).await.map_err(|e| {
            tracing::error!(error = %e, "agent run aborted");
            e
        })?;
        tracing::info!(
            messages = run.produced().len(),
            pending_confirmation = run.pending_confirmation,
            "agent run finished"
        );

        Ok(render_transcript(run.produced()))
    }
}

/// Join the text of each message in append order, one line per message. Messages
/// without text, such as a tool-call-only assistant turn, are skipped.
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(Message::text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
