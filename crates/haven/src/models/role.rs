use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// The speaker of a message in a conversation
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}
