//! Coding Tools
//!
//! `docs`, `run` and `fix` for the coding preset. None of them executes
//! code: documentation and run output are mock text, and `fix` only points
//! at the line an error message names.

use std::fmt::Write as _;

use agent_core::{Arguments, ParameterSchema, Tool, ToolSpec};
use async_trait::async_trait;
use serde_json::json;

use super::{string_arg, string_arg_or};

const DEFAULT_LANGUAGE: &str = "python";

fn language_param() -> ParameterSchema {
    ParameterSchema::optional("language", "string", "Programming language")
        .with_default(json!(DEFAULT_LANGUAGE))
}

/// Looks up programming documentation
pub struct DocsTool;

#[async_trait]
impl Tool for DocsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("docs", "Search programming documentation")
            .param(ParameterSchema::required("topic", "string", "Function, type or concept"))
            .param(language_param())
    }

    async fn invoke(&self, arguments: &Arguments) -> anyhow::Result<String> {
        let topic = string_arg(arguments, "topic")?;
        let language = string_arg_or(arguments, "language", DEFAULT_LANGUAGE)?;
        Ok(format!(
            "Mock documentation for {topic} in {language}:\n\n\
             Signature: {topic}(...)\n\
             Description: reference entry for {topic}\n\
             Example usage: see the {language} standard documentation"
        ))
    }
}

/// Reports what running a snippet would print
pub struct RunCodeTool;

#[async_trait]
impl Tool for RunCodeTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("run", "Run code and get output")
            .param(ParameterSchema::required("code", "string", "Source code to run"))
            .param(language_param())
    }

    async fn invoke(&self, arguments: &Arguments) -> anyhow::Result<String> {
        let code = string_arg(arguments, "code")?;
        let language = string_arg_or(arguments, "language", DEFAULT_LANGUAGE)?;
        let lines = code.lines().count();
        Ok(format!(
            "Mock output from running {lines} lines of {language} code:\n\n\
             Execution successful\n\
             Output: [program output would appear here]"
        ))
    }
}

/// Suggests where a bug is, given the code and its error message
pub struct FixTool;

#[async_trait]
impl Tool for FixTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("fix", "Fix bugs in code")
            .param(ParameterSchema::required("code", "string", "The code with bugs"))
            .param(ParameterSchema::required("error_message", "string", "The error it produces"))
            .param(language_param())
    }

    async fn invoke(&self, arguments: &Arguments) -> anyhow::Result<String> {
        let code = string_arg(arguments, "code")?;
        let error = string_arg(arguments, "error_message")?;
        let language = string_arg_or(arguments, "language", DEFAULT_LANGUAGE)?;

        let mut output = format!("Bug fix suggestion for {language} code:\n\nThe error '{error}'");
        match offending_line(&code, &error) {
            Some((n, line)) => {
                let _ = writeln!(output, " points at line {n}:\n\n    {}", line.trim());
            }
            None => output.push_str(" does not name a line; check the most recent change.\n"),
        }
        output.push_str("\nCompare that line against the language's syntax and fix it there.");
        Ok(output)
    }
}

fn offending_line<'a>(code: &'a str, error: &str) -> Option<(usize, &'a str)> {
    let n = error_line(error)?;
    let line = code.lines().nth(n.checked_sub(1)?)?;
    Some((n, line))
}

/// Line number from messages like `SyntaxError: invalid syntax at line 3`
fn error_line(message: &str) -> Option<usize> {
    let lower = message.to_lowercase();
    let (_, rest) = lower.split_once("line ")?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
