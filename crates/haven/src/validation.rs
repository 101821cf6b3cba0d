//! Check tool call arguments against a tool's input schema before the handler runs.
//!
//! Only the top level of the schema is enforced: the object type, the `required`
//! list and the primitive `type` of each declared property. Nested schemas are left
//! to the handler.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::errors::{AgentError, AgentResult};

lazy_static! {
    static ref TOOL_NAME: Regex = Regex::new(r"^[a-zA-Z0-9_-]{1,64}$").unwrap();
}

/// Tool names go to the model verbatim, so they must already be valid function names
pub fn validate_tool_name(name: &str) -> AgentResult<()> {
    if TOOL_NAME.is_match(name) {
        Ok(())
    } else {
        Err(AgentError::InvalidToolName(name.to_string()))
    }
}

/// Validate `arguments` against `schema`, reporting the first violation as a
/// [`AgentError::ToolExecution`].
pub fn validate_arguments(arguments: &Value, schema: &Value) -> AgentResult<()> {
    if schema.get("type").and_then(Value::as_str) == Some("object") && !arguments.is_object() {
        return Err(AgentError::ToolExecution(format!(
            "expected object arguments, got {}",
            json_type_name(arguments)
        )));
    }

    let Some(object) = arguments.as_object() else {
        return Ok(());
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(name) {
                return Err(AgentError::ToolExecution(format!(
                    "missing required argument '{}'",
                    name
                )));
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (key, value) in object {
            let expected = properties
                .get(key)
                .and_then(|property| property.get("type"))
                .and_then(Value::as_str);
            if let Some(expected) = expected {
                if !matches_type(value, expected) {
                    return Err(AgentError::ToolExecution(format!(
                        "argument '{}' expected type '{}', got {}",
                        key,
                        expected,
                        json_type_name(value)
                    )));
                }
            }
        }
    }

    Ok(())
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
