use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::conversation::Conversation;
use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::tool::{Tool, ToolCall};
use crate::prompt_template::system_prompt;
use crate::providers::base::{check_history, Provider};
use crate::registry::ToolRegistry;

/// The nodes of the agent graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Start,
    /// Ask the model what to do next
    Decide,
    /// The model proposed tool calls; wait for the user to approve them
    AwaitConfirmation,
    /// Run every pending tool call
    ExecuteTool,
    End,
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AgentState::Start => "start",
            AgentState::Decide => "decide",
            AgentState::AwaitConfirmation => "await_confirmation",
            AgentState::ExecuteTool => "execute_tool",
            AgentState::End => "end",
        };
        f.write_str(name)
    }
}

/// What a run is seeded with. A confirmation is replayed as a second user message
/// after the prompt, since nothing is kept between requests.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunInput {
    pub prompt: String,
    pub confirmation: Option<String>,
}

impl RunInput {
    pub fn new<S: Into<String>>(prompt: S) -> Self {
        Self {
            prompt: prompt.into(),
            confirmation: None,
        }
    }

    pub fn with_confirmation<S: Into<String>>(mut self, confirmation: S) -> Self {
        self.confirmation = Some(confirmation.into());
        self
    }
}

/// The state owned by a single run of the graph
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub messages: Conversation,
    /// Tool calls were proposed but no incoming message has approved or declined them yet
    pub pending_confirmation: bool,
    prompt_index: usize,
    seed_len: usize,
}

impl RunState {
    /// The messages appended by the run itself, after the seed
    pub fn produced(&self) -> &[Message] {
        self.messages.messages().get(self.seed_len..).unwrap_or(&[])
    }

    /// The newest user message that arrived after the prompt
    pub fn incoming(&self) -> Option<&Message> {
        self.messages
            .messages()
            .get(self.prompt_index + 1..)
            .unwrap_or(&[])
            .iter()
            .rev()
            .find(|message| message.is_user())
    }
}

/// Routing after DECIDE: any tool use proposed by the latest assistant turn needs approval
pub fn should_confirm(conversation: &Conversation) -> bool {
    conversation
        .last_assistant()
        .is_some_and(|message| !message.tool_calls().is_empty())
}

/// Routing after AWAIT_CONFIRMATION, applied to the newest incoming message.
/// `None` means there is nothing to decide on yet and the run stays suspended.
pub fn should_execute(run: &RunState) -> Option<bool> {
    run.incoming()
        .map(|message| is_confirmation(&message.text()))
}

/// A permissive natural-language gate: "yes" or "go ahead" anywhere, in any case
pub fn is_confirmation(text: &str) -> bool {
    let text = text.to_lowercase();
    text.contains("yes") || text.contains("go ahead")
}

#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Upper bound on a single model call
    pub model_timeout: Duration,
    /// Dispatch the tool calls of one turn concurrently. Results are still appended in
    /// the order the calls were proposed.
    pub concurrent_tools: bool,
    /// Replaces the built-in system prompt template
    pub system_prompt_file: Option<PathBuf>,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            model_timeout: Duration::from_secs(120),
            concurrent_tools: false,
            system_prompt_file: None,
        }
    }
}

/// Agent drives a model through the decide / confirm / execute graph, using the tools
/// in its registry
pub struct Agent {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    tools: Vec<Tool>,
    system_prompt: String,
    options: AgentOptions,
}

impl Agent {
    pub fn new(provider: Arc<dyn Provider>, registry: Arc<ToolRegistry>) -> AgentResult<Self> {
        Self::with_options(provider, registry, AgentOptions::default())
    }

    pub fn with_options(
        provider: Arc<dyn Provider>,
        registry: Arc<ToolRegistry>,
        options: AgentOptions,
    ) -> AgentResult<Self> {
        let tools = registry.tools();
        let system_prompt = system_prompt(&tools, options.system_prompt_file.as_deref())
            .map_err(|e| AgentError::Internal(format!("failed to render system prompt: {}", e)))?;

        Ok(Self {
            provider,
            registry,
            tools,
            system_prompt,
            options,
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Execute the graph from START until it reaches END.
    ///
    /// Tool failures are recorded in the returned state; only model failures and
    /// history violations abort the run.
    pub async fn run(&self, input: RunInput) -> AgentResult<RunState> {
        let mut run = self.seed(input)?;
        let mut state = AgentState::Start;

        while state != AgentState::End {
            let next = self.step(state, &mut run).await?;
            tracing::debug!(from = %state, to = %next, "agent transition");
            state = next;
        }

        Ok(run)
    }

    fn seed(&self, input: RunInput) -> AgentResult<RunState> {
        let mut messages = Conversation::new();
        messages.push(Message::system(&self.system_prompt))?;
        let prompt_index = messages.len();
        messages.push(Message::user(input.prompt))?;
        if let Some(confirmation) = input.confirmation {
            messages.push(Message::user(confirmation))?;
        }

        let seed_len = messages.len();
        Ok(RunState {
            messages,
            pending_confirmation: false,
            prompt_index,
            seed_len,
        })
    }

    async fn step(&self, state: AgentState, run: &mut RunState) -> AgentResult<AgentState> {
        match state {
            AgentState::Start => Ok(AgentState::Decide),
            AgentState::Decide => {
                let reply = self.decide(run.messages.messages()).await?;
                run.messages.push(reply)?;
                if should_confirm(&run.messages) {
                    run.pending_confirmation = true;
                    Ok(AgentState::AwaitConfirmation)
                } else {
                    Ok(AgentState::End)
                }
            }
            AgentState::AwaitConfirmation => match should_execute(run) {
                Some(approved) => {
                    run.pending_confirmation = false;
                    if approved {
                        Ok(AgentState::ExecuteTool)
                    } else {
                        tracing::info!("tool calls declined");
                        Ok(AgentState::End)
                    }
                }
                None => {
                    tracing::info!("waiting for confirmation of proposed tool calls");
                    Ok(AgentState::End)
                }
            },
            AgentState::ExecuteTool => {
                self.execute_tools(run).await?;
                // Single shot: the model does not get to react to the tool output
                Ok(AgentState::End)
            }
            AgentState::End => Ok(AgentState::End),
        }
    }

    async fn decide(&self, messages: &[Message]) -> AgentResult<Message> {
        check_history(messages)?;

        let (reply, usage) = timeout(
            self.options.model_timeout,
            self.provider.complete(messages, &self.tools),
        )
        .await
        .map_err(|_| {
            AgentError::ModelUnavailable(format!(
                "no response within {:?}",
                self.options.model_timeout
            ))
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "model call failed");
            AgentError::from(e)
        })?;

        if !reply.is_assistant() {
            return Err(AgentError::ModelResponseInvalid(format!(
                "expected an assistant message, got {:?}",
                reply.role()
            )));
        }

        tracing::debug!(
            tool_calls = reply.tool_calls().len(),
            total_tokens = ?usage.total_tokens,
            "model replied"
        );
        Ok(reply)
    }

    async fn execute_tools(&self, run: &mut RunState) -> AgentResult<()> {
        let calls: Vec<ToolCall> = run
            .messages
            .last_assistant()
            .map(|message| message.tool_calls().to_vec())
            .unwrap_or_default();

        let outputs = if self.options.concurrent_tools {
            let futures = calls.iter().map(|call| self.registry.dispatch(call));
            futures::future::join_all(futures).await
        } else {
            let mut outputs = Vec::with_capacity(calls.len());
            for call in &calls {
                outputs.push(self.registry.dispatch(call).await);
            }
            outputs
        };

        for (call, output) in calls.iter().zip(outputs) {
            match &output {
                Ok(_) => tracing::info!(tool = %call.name, id = %call.id, "tool call succeeded"),
                Err(e) => {
                    tracing::warn!(tool = %call.name, id = %call.id, error = %e, "tool call failed")
                }
            }
            run.messages.push(Message::tool(call.id.clone(), output))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::errors::ProviderError;
    use crate::providers::mock::MockProvider;
    use crate::registry::FunctionTool;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::providers::base::Usage;
    use crate::providers::errors::ProviderResult;

    fn number_schema() -> Value {
        json!({
            "type": "object",
            "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
            "required": ["a", "b"]
        })
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                "add",
                "Adds two numbers",
                number_schema(),
                FunctionTool::new(|args: Value| async move {
                    let a = args["a"].as_f64().unwrap_or(0.0);
                    let b = args["b"].as_f64().unwrap_or(0.0);
                    Ok((a + b).to_string())
                }),
            )
            .unwrap();
        registry
            .register(
                "echo",
                "Echoes back the input",
                json!({"type": "object", "properties": {"message": {"type": "string"}}}),
                FunctionTool::new(|args: Value| async move {
                    Ok(args["message"].as_str().unwrap_or_default().to_string())
                }),
            )
            .unwrap();
        Arc::new(registry)
    }

    fn agent(provider: MockProvider) -> Agent {
        Agent::new(Arc::new(provider), registry()).unwrap()
    }

    fn propose_add() -> Message {
        Message::assistant("I will add 5 and 8 with the add tool.")
            .with_tool_call(ToolCall::new("call_1", "add", json!({"a": 5, "b": 8})))
    }

    #[tokio::test]
    async fn test_plain_answer_ends_after_decide() {
        let agent = agent(MockProvider::new(vec![Message::assistant("Hello!")]));

        let run = agent.run(RunInput::new("Hi")).await.unwrap();

        assert!(!run.pending_confirmation);
        assert_eq!(run.produced(), &[Message::assistant("Hello!")]);
    }

    #[tokio::test]
    async fn test_tool_calls_always_wait_for_confirmation() {
        let agent = agent(MockProvider::new(vec![propose_add()]));

        let run = agent.run(RunInput::new("Add 5 and 8")).await.unwrap();

        assert!(should_confirm(&run.messages));
        assert!(run.pending_confirmation);
        // nothing was executed
        assert_eq!(run.produced(), &[propose_add()]);
    }

    #[tokio::test]
    async fn test_prompt_alone_never_confirms() {
        // the prompt itself is not an incoming confirmation, even if it says yes
        let agent = agent(MockProvider::new(vec![propose_add()]));

        let run = agent
            .run(RunInput::new("yes, please add 5 and 8"))
            .await
            .unwrap();

        assert!(run.pending_confirmation);
        assert_eq!(run.produced().len(), 1);
    }

    #[tokio::test]
    async fn test_confirmed_tool_call_executes() {
        let agent = agent(MockProvider::new(vec![propose_add()]));

        let run = agent
            .run(RunInput::new("Add 5 and 8").with_confirmation("Yes please"))
            .await
            .unwrap();

        assert!(!run.pending_confirmation);
        assert_eq!(
            run.produced(),
            &[propose_add(), Message::tool("call_1", Ok("13".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_declined_tool_call_ends() {
        let agent = agent(MockProvider::new(vec![propose_add()]));

        let run = agent
            .run(RunInput::new("Add 5 and 8").with_confirmation("no, maybe later"))
            .await
            .unwrap();

        assert!(!run.pending_confirmation);
        assert_eq!(run.produced(), &[propose_add()]);
    }

    #[tokio::test]
    async fn test_failed_calls_do_not_abort_the_others() {
        let reply = Message::assistant("")
            .with_tool_call(ToolCall::new("a", "add", json!({"a": 1, "b": 2})))
            .with_tool_call(ToolCall::new("b", "multiply", json!({"a": 2, "b": 3})))
            .with_tool_call(ToolCall::new("c", "echo", json!({"message": "done"})));
        let agent = agent(MockProvider::new(vec![reply.clone()]));

        let run = agent
            .run(RunInput::new("do things").with_confirmation("go ahead"))
            .await
            .unwrap();

        assert_eq!(
            run.produced(),
            &[
                reply,
                Message::tool("a", Ok("3".to_string())),
                Message::tool("b", Err(AgentError::UnknownTool("multiply".into()))),
                Message::tool("c", Ok("done".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_tools_keep_call_order() {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                "sleep",
                "Sleeps then reports",
                json!({"type": "object", "properties": {"ms": {"type": "integer"}}}),
                FunctionTool::new(|args: Value| async move {
                    let ms = args["ms"].as_u64().unwrap_or(0);
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(format!("slept {}", ms))
                }),
            )
            .unwrap();

        let reply = Message::assistant("")
            .with_tool_call(ToolCall::new("slow", "sleep", json!({"ms": 40})))
            .with_tool_call(ToolCall::new("fast", "sleep", json!({"ms": 1})));
        let options = AgentOptions {
            concurrent_tools: true,
            ..AgentOptions::default()
        };
        let agent = Agent::with_options(
            Arc::new(MockProvider::new(vec![reply])),
            Arc::new(registry),
            options,
        )
        .unwrap();

        let run = agent
            .run(RunInput::new("sleep").with_confirmation("yes"))
            .await
            .unwrap();

        let outputs: Vec<String> = run.produced()[1..].iter().map(Message::text).collect();
        assert_eq!(outputs, vec!["slept 40", "slept 1"]);
    }

    #[tokio::test]
    async fn test_model_failure_aborts_the_run() {
        let provider = MockProvider::with_results(vec![Err(ProviderError::Unavailable(
            "connection refused".into(),
        ))]);
        let agent = agent(provider);

        let err = agent.run(RunInput::new("Hi")).await.unwrap_err();
        assert_eq!(err, AgentError::ModelUnavailable("connection refused".into()));
    }

    #[tokio::test]
    async fn test_model_timeout_is_unavailable() {
        struct SlowProvider;

        #[async_trait]
        impl Provider for SlowProvider {
            async fn complete(
                &self,
                _messages: &[Message],
                _tools: &[Tool],
            ) -> ProviderResult<(Message, Usage)> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok((Message::assistant("too late"), Usage::default()))
            }
        }

        let options = AgentOptions {
            model_timeout: Duration::from_millis(20),
            ..AgentOptions::default()
        };
        let agent = Agent::with_options(Arc::new(SlowProvider), registry(), options).unwrap();

        let err = agent.run(RunInput::new("Hi")).await.unwrap_err();
        assert!(matches!(err, AgentError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_non_assistant_reply_is_invalid() {
        let agent = agent(MockProvider::new(vec![Message::user("I am not the model")]));

        let err = agent.run(RunInput::new("Hi")).await.unwrap_err();
        assert!(matches!(err, AgentError::ModelResponseInvalid(_)));
    }

    #[tokio::test]
    async fn test_model_sees_system_prompt_and_both_seed_messages() {
        let provider = MockProvider::new(vec![propose_add()]);
        let agent = Agent::new(Arc::new(provider.clone()), registry()).unwrap();

        agent
            .run(RunInput::new("Add 5 and 8").with_confirmation("yes"))
            .await
            .unwrap();

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            vec![
                Message::system(agent.system_prompt()),
                Message::user("Add 5 and 8"),
                Message::user("yes"),
            ]
        );
        assert!(agent.system_prompt().contains("add: Adds two numbers"));
    }

    #[test]
    fn test_custom_system_prompt_still_asks_for_a_plan() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("prompt.md");
        std::fs::write(&file_path, "Just answer quickly.").unwrap();

        let options = AgentOptions {
            system_prompt_file: Some(file_path),
            ..AgentOptions::default()
        };
        let agent =
            Agent::with_options(Arc::new(MockProvider::default()), registry(), options).unwrap();

        assert!(agent
            .system_prompt()
            .starts_with("Explain your plan before acting."));
        assert!(agent.system_prompt().ends_with("Just answer quickly."));
    }

    #[test]
    fn test_is_confirmation() {
        for text in ["yes", "YES", "Yes, do it", "go ahead", "GO AHEAD", "sure, Go Ahead"] {
            assert!(is_confirmation(text), "{text} should confirm");
        }
        for text in ["no", "maybe", "go", "ahead", ""] {
            assert!(!is_confirmation(text), "{text} should not confirm");
        }
    }

    #[test]
    fn test_should_confirm_looks_at_latest_assistant() {
        let conversation = Conversation::from_messages(vec![
            Message::user("Add 5 and 8"),
            propose_add(),
            Message::user("yes"),
        ])
        .unwrap();
        assert!(should_confirm(&conversation));

        let conversation = Conversation::from_messages(vec![
            Message::user("What is mindfulness?"),
            Message::assistant("Paying attention on purpose."),
        ])
        .unwrap();
        assert!(!should_confirm(&conversation));
    }
}
