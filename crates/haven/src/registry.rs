use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{Tool, ToolCall};
use crate::validation::{validate_arguments, validate_tool_name};

/// Executes a tool once its arguments have been validated against the tool's schema.
///
/// Handlers return the plain string result, or [`AgentError::ToolExecution`] on failure.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Value) -> AgentResult<String>;
}

type BoxedHandlerFn =
    dyn Fn(Value) -> Pin<Box<dyn Future<Output = AgentResult<String>> + Send>> + Send + Sync;

/// A handler backed by an async closure
pub struct FunctionTool {
    handler: Arc<BoxedHandlerFn>,
}

impl FunctionTool {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AgentResult<String>> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |arguments| Box::pin(handler(arguments))),
        }
    }
}

#[async_trait]
impl ToolHandler for FunctionTool {
    async fn call(&self, arguments: Value) -> AgentResult<String> {
        (self.handler)(arguments).await
    }
}

/// A registered tool: what the model sees plus the handler that runs it
#[derive(Clone)]
pub struct ToolDefinition {
    pub tool: Tool,
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolDefinition {
    pub fn name(&self) -> &str {
        &self.tool.name
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.tool.name)
            .field("description", &self.tool.description)
            .finish()
    }
}

/// The table of tools available to the agent.
///
/// Built once at startup and then shared read-only between runs, usually behind an `Arc`.
#[derive(Debug, Default, Clone)]
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails without modifying the registry when the name is taken
    /// or is not a valid function name.
    pub fn register<N, D, H>(
        &mut self,
        name: N,
        description: D,
        input_schema: Value,
        handler: H,
    ) -> AgentResult<()>
    where
        N: Into<String>,
        D: Into<String>,
        H: ToolHandler + 'static,
    {
        let tool = Tool::new(name, description, input_schema);
        validate_tool_name(&tool.name)?;
        if self.index.contains_key(&tool.name) {
            return Err(AgentError::DuplicateTool(tool.name));
        }

        tracing::debug!(tool = %tool.name, "registered tool");
        self.index.insert(tool.name.clone(), self.definitions.len());
        self.definitions.push(ToolDefinition {
            tool,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> AgentResult<&ToolDefinition> {
        self.index
            .get(name)
            .map(|&i| &self.definitions[i])
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))
    }

    /// All registered definitions, in registration order
    pub fn list(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// The model-facing description of every registered tool
    pub fn tools(&self) -> Vec<Tool> {
        self.definitions.iter().map(|d| d.tool.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Run a single tool call: look up the tool, validate the arguments, invoke the handler
    pub async fn dispatch(&self, call: &ToolCall) -> AgentResult<String> {
        let definition = self.lookup(&call.name)?;
        validate_arguments(&call.arguments, &definition.tool.input_schema)?;
        definition.handler.call(call.arguments.clone()).await
    }
}
