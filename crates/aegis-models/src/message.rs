//! Conversation message shape shared by the executor, router, and LLM
//! adapter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// A single conversation turn. Invariant: a `Tool` message must follow an
/// `Assistant` message whose `tool_calls` contains a matching id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Whether this assistant message carries one or more tool calls.
    pub fn has_tool_calls(&self) -> bool {
        self.role == Role::Assistant
            && self
                .tool_calls
                .as_ref()
                .is_some_and(|calls| !calls.is_empty())
    }
}

/// Validate the assistant/tool alternation invariant over a message slice:
/// every `Tool` message must be immediately preceded (possibly after other
/// tool messages from the same batch) by an `Assistant` message whose
/// `tool_calls` contains the matching id.
pub fn validate_tool_alternation(messages: &[Message]) -> Result<(), String> {
    let mut pending: Option<&[ToolCall]> = None;
    for msg in messages {
        match msg.role {
            Role::Assistant => {
                pending = msg.tool_calls.as_deref();
            }
            Role::Tool => {
                let id = msg
                    .tool_call_id
                    .as_deref()
                    .ok_or_else(|| "tool message missing tool_call_id".to_string())?;
                let calls = pending
                    .ok_or_else(|| format!("tool message {id} has no preceding assistant call"))?;
                if !calls.iter().any(|c| c.id == id) {
                    return Err(format!("tool message {id} does not match any pending call"));
                }
            }
            _ => {}
        }
    }
    Ok(())
}
