//! These models represent the objects passed around by the agent
//!
//! There are a few related formats we need to interact with:
//! - the query parameters of the agent HTTP routes, sent from the dashboard to the agent
//! - openai-style chat completion messages/tools, sent from the agent to the model
//! - tool calls, sent from the agent to the handlers in the tool registry
//!
//! We always immediately convert those data models into the internal structs using
//! to/from helpers, so the internal models are not an exact match to any of these formats.
pub mod message;
pub mod role;
pub mod tool;
