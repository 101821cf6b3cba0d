use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Map, Value};

use super::base::Usage;
use super::errors::{ProviderError, ProviderResult};
use crate::models::message::Message;
use crate::models::tool::{Tool, ToolCall};

lazy_static! {
    static ref INVALID_FUNCTION_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
}

/// Convert internal messages to the OpenAI chat completions message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| match message {
            Message::System { text } => json!({"role": "system", "content": text}),
            Message::User { text } => json!({"role": "user", "content": text}),
            Message::Assistant { text, tool_calls } => {
                let mut converted = json!({"role": "assistant"});
                if !text.is_empty() {
                    converted["content"] = json!(text);
                }
                if !tool_calls.is_empty() {
                    converted["tool_calls"] = tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "id": call.id,
                                "type": "function",
                                "function": {
                                    "name": sanitize_function_name(&call.name),
                                    "arguments": call.arguments.to_string(),
                                }
                            })
                        })
                        .collect();
                }
                converted
            }
            Message::Tool {
                tool_call_id,
                output,
            } => {
                // A failed call is shown as output so the model can interpret the error
                let content = match output {
                    Ok(result) => result.clone(),
                    Err(err) => format!("The tool call returned the following error:\n{}", err),
                };
                json!({"role": "tool", "content": content, "tool_call_id": tool_call_id})
            }
        })
        .collect()
}

/// Convert tools to the OpenAI function tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": sanitize_function_name(&tool.name),
                    "description": tool.description,
                    "parameters": tool.input_schema,
                }
            })
        })
        .collect()
}

/// Build a chat completions request body
pub fn create_request(
    model: &str,
    messages: &[Message],
    tools: &[Tool],
    temperature: Option<f32>,
    max_tokens: Option<i32>,
) -> Value {
    let mut payload = Map::new();
    payload.insert("model".to_string(), json!(model));
    payload.insert(
        "messages".to_string(),
        json!(messages_to_openai_spec(messages)),
    );
    if !tools.is_empty() {
        payload.insert("tools".to_string(), json!(tools_to_openai_spec(tools)));
    }
    if let Some(temp) = temperature {
        payload.insert("temperature".to_string(), json!(temp));
    }
    if let Some(tokens) = max_tokens {
        payload.insert("max_tokens".to_string(), json!(tokens));
    }
    Value::Object(payload)
}

/// Send a chat completions request and return the decoded body
pub async fn send_request(request: RequestBuilder, payload: &Value) -> ProviderResult<Value> {
    let response = request.json(payload).send().await?;

    match response.status() {
        StatusCode::OK => {
            let body: Value = response
                .json()
                .await
                .map_err(|e| ProviderError::ResponseInvalid(e.to_string()))?;
            if let Some(error) = body.get("error") {
                return Err(ProviderError::Unavailable(format!("API error: {}", error)));
            }
            Ok(body)
        }
        status if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() => {
            Err(ProviderError::Unavailable(format!("Server error: {}", status)))
        }
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(ProviderError::Unavailable(format!(
                "Request failed: {}\n{}",
                status, body
            )))
        }
    }
}

/// Convert an OpenAI chat completions response into an assistant message
pub fn openai_response_to_message(response: &Value) -> ProviderResult<Message> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .filter(|message| message.is_object())
        .ok_or_else(|| {
            ProviderError::ResponseInvalid("response contains no message choice".to_string())
        })?;

    let text = original
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let mut message = Message::assistant(text);

    if let Some(tool_calls) = original.get("tool_calls").and_then(Value::as_array) {
        for tool_call in tool_calls {
            message = message.with_tool_call(parse_tool_call(tool_call)?);
        }
    }

    Ok(message)
}

fn parse_tool_call(tool_call: &Value) -> ProviderResult<ToolCall> {
    let id = tool_call
        .get("id")
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));

    let name = tool_call["function"]["name"]
        .as_str()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            ProviderError::ResponseInvalid(format!("tool call {} has no function name", id))
        })?;

    // Arguments arrive as a JSON encoded string; an absent value means no arguments
    let arguments = match &tool_call["function"]["arguments"] {
        Value::String(raw) if raw.trim().is_empty() => json!({}),
        Value::String(raw) => serde_json::from_str(raw).map_err(|e| {
            ProviderError::ResponseInvalid(format!(
                "could not interpret tool call arguments for id {}: {}",
                id, e
            ))
        })?,
        Value::Null => json!({}),
        other => other.clone(),
    };

    Ok(ToolCall::new(id, name, arguments))
}

/// Read token usage from a response, tolerating servers that omit it
pub fn get_usage(data: &Value) -> Usage {
    let Some(usage) = data.get("usage") else {
        return Usage::default();
    };

    let input_tokens = usage
        .get("prompt_tokens")
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok());
    let output_tokens = usage
        .get("completion_tokens")
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok());
    let total_tokens = usage
        .get("total_tokens")
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => input.checked_add(output),
            _ => None,
        });

    Usage::new(input_tokens, output_tokens, total_tokens)
}

fn sanitize_function_name(name: &str) -> String {
    INVALID_FUNCTION_CHARS.replace_all(name, "_").to_string()
}
