//! Summarize Tool
//!
//! Extractive: keeps whole leading sentences up to the length limit and
//! falls back to a hard cut when even the first sentence is too long.

use agent_core::{Arguments, ParameterSchema, Tool, ToolSpec};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::string_arg;
use crate::error::{Result, ToolError};

const DEFAULT_MAX_LENGTH: usize = 200;

pub struct SummarizeTool;

#[async_trait]
impl Tool for SummarizeTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("summarize", "Summarize a piece of text")
            .param(ParameterSchema::required("text", "string", "The text to summarize"))
            .param(
                ParameterSchema::optional(
                    "max_length",
                    "number",
                    "Maximum summary length in characters",
                )
                .with_default(json!(DEFAULT_MAX_LENGTH)),
            )
    }

    async fn invoke(&self, arguments: &Arguments) -> anyhow::Result<String> {
        let text = string_arg(arguments, "text")?;
        let max_length = max_length(arguments)?;
        let summary = summarize(&text, max_length);
        Ok(format!("Summary (max {max_length} chars): {summary}"))
    }
}

fn max_length(arguments: &Arguments) -> Result<usize> {
    let value = match arguments.get("max_length") {
        None | Some(Value::Null) => return Ok(DEFAULT_MAX_LENGTH),
        Some(value) => value,
    };
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|&n| n > 0)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| ToolError::InvalidArgument {
            name: "max_length".into(),
            reason: format!("expected a positive integer, got {value}"),
        })
}

/// Leading sentences of `text` that fit in `max_chars`
pub fn summarize(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }

    let mut summary = String::new();
    let sentences = flat
        .split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty());
    for sentence in sentences {
        let joined = summary.chars().count() + usize::from(!summary.is_empty());
        if joined + sentence.chars().count() > max_chars {
            break;
        }
        if !summary.is_empty() {
            summary.push(' ');
        }
        summary.push_str(sentence);
    }

    if summary.is_empty() {
        let cut: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
        summary = format!("{}...", cut.trim_end());
    }
    summary
}
