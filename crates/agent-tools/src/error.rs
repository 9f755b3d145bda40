//! Error Types for the built-in tools

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolError>;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Unknown timezone: {0}. Please use a valid timezone name.")]
    UnknownTimezone(String),

    #[error("Error calculating expression: {0}")]
    Evaluation(String),

    #[error("Path escapes the tool directory: {0}")]
    PathOutsideRoot(String),

    #[error("Unknown {kind} '{name}'. Available: {available}")]
    UnknownName {
        kind: &'static str,
        name: String,
        available: String,
    },
}
