//! The tools registered when the service starts.

use serde_json::{json, Value};

use crate::errors::{AgentError, AgentResult};
use crate::registry::{FunctionTool, ToolRegistry};

/// Build the default registry
pub fn default_registry() -> AgentResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry)?;
    Ok(registry)
}

pub fn register_builtin_tools(registry: &mut ToolRegistry) -> AgentResult<()> {
    registry.register(
        "add",
        "Add two numbers and return their sum",
        json!({
            "type": "object",
            "properties": {
                "a": {"type": "number", "description": "The first number"},
                "b": {"type": "number", "description": "The second number"}
            },
            "required": ["a", "b"]
        }),
        FunctionTool::new(|args: Value| async move { add(&args) }),
    )
}

fn add(args: &Value) -> AgentResult<String> {
    let operand = |name: &str| {
        args[name]
            .as_f64()
            .ok_or_else(|| AgentError::ToolExecution(format!("'{}' must be a number", name)))
    };
    let sum = operand("a")? + operand("b")?;
    if !sum.is_finite() {
        return Err(AgentError::ToolExecution("sum is out of range".to_string()));
    }

    // Integers print without a trailing ".0"
    if let (Some(a), Some(b)) = (args["a"].as_i64(), args["b"].as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Ok(sum.to_string());
        }
    }
    Ok(sum.to_string())
}
