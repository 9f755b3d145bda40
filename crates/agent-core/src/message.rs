//! Conversation Turns
//!
//! The unit of conversation shared by memory, the reasoning loop and providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a turn's originator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result (injected as context)
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// A single turn in a conversation. Fields are read-only once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,

    content: String,

    /// Tool that produced this turn (tool turns only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,

    /// Pinned turns are never evicted from memory
    #[serde(default)]
    pinned: bool,

    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_name: None,
            pinned: false,
            timestamp: Utc::now(),
        }
    }

    /// Pinned system instructions
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content).pinned()
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Result (or error description) of a tool invocation
    pub fn tool(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        let mut turn = Self::new(Role::Tool, content);
        turn.tool_name = Some(tool_name.into());
        turn
    }

    /// Mark the turn as exempt from eviction
    #[must_use]
    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Estimate token count (rough approximation)
    #[allow(clippy::cast_possible_truncation)]
    pub fn estimate_tokens(&self) -> u32 {
        // ~4 characters per token, +4 for role overhead
        (self.content.len() / 4) as u32 + 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_creation() {
        let turn = Turn::user("Hello");
        assert_eq!(turn.role(), Role::User);
        assert_eq!(turn.content(), "Hello");
        assert!(!turn.is_pinned());
        assert!(turn.tool_name().is_none());
    }

    #[test]
    fn test_system_turns_are_pinned() {
        assert!(Turn::system("You are helpful.").is_pinned());
    }

    #[test]
    fn test_tool_turn_records_name() {
        let turn = Turn::tool("add", "5");
        assert_eq!(turn.role(), Role::Tool);
        assert_eq!(turn.tool_name(), Some("add"));
        assert_eq!(turn.content(), "5");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
