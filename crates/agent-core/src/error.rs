//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Model backend could not be reached (connection refused, timeout)
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Model backend rejected or failed the request
    #[error("Generation error: {0}")]
    Generation(String),

    /// A tool with this name is already registered
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    /// Tool not found in registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool rejected its arguments or failed while running
    #[error("Error executing tool '{name}': {reason}")]
    ToolExecution { name: String, reason: String },

    /// Tool directive found but could not be parsed
    #[error("Malformed tool directive: {0}")]
    MalformedIntent(String),

    /// Tool rounds for one user turn ran out
    #[error("Tool iteration budget ({0}) exhausted")]
    IterationBudgetExceeded(usize),

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Build a tool execution error
    pub fn tool_execution(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ToolExecution {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Errors that stay inside the reasoning loop as tool-result turns
    pub fn is_tool_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTool(_) | Self::ToolExecution { .. } | Self::MalformedIntent(_)
        )
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::Io(_))
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::BackendUnavailable(_) => {
                "The model runtime is not reachable. Is it running?".into()
            }
            Self::Generation(msg) => format!("The model runtime reported an error: {msg}"),
            Self::DuplicateTool(name) => format!("A tool named '{name}' is already registered."),
            Self::UnknownTool(name) => format!("The tool '{name}' is not available."),
            Self::ToolExecution { name, reason } => format!("Tool '{name}' failed: {reason}"),
            Self::MalformedIntent(reason) => format!("Could not read the tool call: {reason}"),
            Self::IterationBudgetExceeded(_) => {
                "The request needed too many tool calls. Please try a simpler query.".into()
            }
            Self::Session(_) => "The conversation could not be saved or loaded.".into(),
            Self::Config(msg) => format!("Invalid configuration: {msg}"),
            Self::Io(_) | Self::Json(_) => "An unexpected error occurred.".into(),
        }
    }
}
