//! Service Kit - Agent Tools
//!
//! The built-in and preset tools, each implementing `agent_core::Tool`.

mod calculator;
mod clock;
mod coding;
mod files;
mod search;
mod summarize;
mod weather;

pub use calculator::CalculatorTool;
pub use clock::TimeTool;
pub use coding::{DocsTool, FixTool, RunCodeTool};
pub use files::{ReadFileTool, WriteFileTool};
pub use search::SearchTool;
pub use summarize::{summarize, SummarizeTool};
pub use weather::WeatherTool;

use std::borrow::Cow;

use agent_core::Arguments;
use serde_json::Value;

use crate::error::{Result, ToolError};

/// A string argument; numbers and booleans are accepted in their JSON form.
fn string_arg<'a>(arguments: &'a Arguments, name: &str) -> Result<Cow<'a, str>> {
    match arguments.get(name) {
        Some(Value::String(s)) => Ok(Cow::Borrowed(s)),
        Some(value @ (Value::Number(_) | Value::Bool(_))) => Ok(Cow::Owned(value.to_string())),
        Some(other) => Err(ToolError::InvalidArgument {
            name: name.to_string(),
            reason: format!("expected a string, got {other}"),
        }),
        None => Err(ToolError::MissingArgument(name.to_string())),
    }
}

/// Like `string_arg`, falling back to `default` when absent or null.
fn string_arg_or<'a>(
    arguments: &'a Arguments,
    name: &str,
    default: &'a str,
) -> Result<Cow<'a, str>> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(Cow::Borrowed(default)),
        Some(_) => string_arg(arguments, name),
    }
}
