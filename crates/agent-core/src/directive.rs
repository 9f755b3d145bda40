//! Tool Directive Grammar (version 1)
//!
//! A model requests a tool by emitting a fenced block tagged `tool` that holds
//! one JSON object:
//!
//! ````text
//! ```tool
//! {"tool": "add", "arguments": {"a": 2, "b": 3}}
//! ```
//! ````
//!
//! Only the first `tool` fence in a response is considered. `parameters` is
//! accepted as an alias of `arguments`, and `arguments` may be omitted. JSON
//! outside a fence is ordinary answer text. The block closes on the fence
//! that follows the JSON value, so backticks inside string arguments are data.

use serde_json::Value;

use crate::tool::{Arguments, ToolInvocation};

/// Grammar version advertised to the model
pub const VERSION: u32 = 1;

const FENCE_OPEN: &str = "```tool";
const FENCE_CLOSE: &str = "```";

/// Example block included in the system prompt
pub const FORMAT_EXAMPLE: &str =
    "```tool\n{\"tool\": \"tool_name\", \"arguments\": {\"arg\": \"value\"}}\n```";

/// Outcome of scanning a model response
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    /// Plain answer, no tool requested
    None,
    /// Well-formed tool request
    Tool(ToolInvocation),
    /// A tool block was present but unusable
    Malformed(String),
}

impl Intent {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Scan a model response for a tool directive
pub fn parse(text: &str) -> Intent {
    let Some(body_start) = find_open(text) else {
        return Intent::None;
    };

    // Read exactly one JSON value so fences inside string arguments stay content
    let rest = &text[body_start..];
    let mut values = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
    let value = match values.next() {
        None => return Intent::Malformed(missing_body(rest)),
        Some(Err(e)) if e.is_eof() || !has_closing_fence(rest) => {
            return Intent::Malformed("unterminated tool block".into());
        }
        Some(Err(_)) if rest.trim_start().starts_with(FENCE_CLOSE) => {
            return Intent::Malformed("empty tool block".into());
        }
        Some(Err(e)) => return Intent::Malformed(format!("invalid JSON in tool block: {e}")),
        Some(Ok(v)) => v,
    };

    let after = rest[values.byte_offset()..].trim_start();
    if !after.starts_with(FENCE_CLOSE) {
        return Intent::Malformed(if has_closing_fence(after) {
            "unexpected text after JSON in tool block".into()
        } else {
            "unterminated tool block".into()
        });
    }

    let Value::Object(mut object) = value else {
        return Intent::Malformed("tool block must contain a JSON object".into());
    };

    let name = match object.remove("tool") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(_) => return Intent::Malformed("\"tool\" must be a non-empty string".into()),
        None => return Intent::Malformed("missing \"tool\" field".into()),
    };

    let arguments = match object
        .remove("arguments")
        .or_else(|| object.remove("parameters"))
    {
        None | Some(Value::Null) => Arguments::new(),
        Some(Value::Object(map)) => map,
        Some(_) => return Intent::Malformed("\"arguments\" must be a JSON object".into()),
    };

    Intent::Tool(ToolInvocation::new(name, arguments))
}

/// Render an invocation in directive form
pub fn render(call: &ToolInvocation) -> String {
    let body = serde_json::json!({
        "tool": call.name,
        "arguments": call.arguments,
    });
    format!("{FENCE_OPEN}\n{body}\n{FENCE_CLOSE}")
}

fn missing_body(rest: &str) -> String {
    if has_closing_fence(rest) {
        "empty tool block".into()
    } else {
        "unterminated tool block".into()
    }
}

// A closing fence counts only at the start of a line
fn has_closing_fence(text: &str) -> bool {
    text.lines().any(|line| line.trim_start().starts_with(FENCE_CLOSE))
}

// Byte offset just past an opening fence whose tag is exactly `tool`
fn find_open(text: &str) -> Option<usize> {
    text.match_indices(FENCE_OPEN)
        .map(|(i, m)| i + m.len())
        .find(|&end| text[end..].chars().next().is_none_or(char::is_whitespace))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_has_no_intent() {
        assert_eq!(parse("The answer is 42."), Intent::None);
        assert_eq!(parse(""), Intent::None);
    }

    #[test]
    fn test_bare_json_is_not_a_directive() {
        let text = r#"{"tool": "add", "arguments": {"a": 1, "b": 2}}"#;
        assert_eq!(parse(text), Intent::None);
    }

    #[test]
    fn test_parse_tool_call() {
        let content = r#"Let me check that for you.
```tool
{"tool": "add", "arguments": {"a": 2, "b": 3}}
```"#;

        let Intent::Tool(call) = parse(content) else {
            panic!("expected tool intent");
        };
        assert_eq!(call.name, "add");
        assert_eq!(call.arguments.get("a"), Some(&json!(2)));
        assert_eq!(call.arguments.get("b"), Some(&json!(3)));
    }

    #[test]
    fn test_parameters_alias_and_missing_arguments() {
        let aliased = "```tool\n{\"tool\": \"weather\", \"parameters\": {\"location\": \"Oslo\"}}\n```";
        let Intent::Tool(call) = parse(aliased) else {
            panic!("expected tool intent");
        };
        assert_eq!(call.arguments.get("location"), Some(&json!("Oslo")));

        let Intent::Tool(call) = parse("```tool\n{\"tool\": \"time\"}\n```") else {
            panic!("expected tool intent");
        };
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn test_malformed_blocks() {
        let cases = [
            ("```tool\n{\"tool\": \"add\"", "unterminated"),
            ("```tool\n```", "empty"),
            ("```tool\n   ", "unterminated"),
            ("```tool\n{\"tool\": \"a\", \"arguments\": {\"x\": \"\\n```", "unterminated"),
            ("```tool\n{\"tool\": \"add\", \"arguments\": {a=2}}\n```", "invalid JSON"),
            ("```tool\n[1, 2]\n```", "JSON object"),
            ("```tool\n{\"arguments\": {}}\n```", "missing \"tool\""),
            ("```tool\n{\"tool\": 7}\n```", "non-empty string"),
            ("```tool\n{\"tool\": \"add\", \"arguments\": [2, 3]}\n```", "\"arguments\""),
        ];

        for (text, expected) in cases {
            match parse(text) {
                Intent::Malformed(reason) => {
                    assert!(reason.contains(expected), "{text:?} gave {reason:?}");
                }
                other => panic!("{text:?} parsed as {other:?}"),
            }
        }
    }

    #[test]
    fn test_backticks_inside_arguments() {
        let text = "```tool\n{\"tool\":\"write_file\",\"arguments\":{\"filename\":\"a.md\",\
                    \"content\":\"```rust\\nfn main() {}\\n```\"}}\n```";

        let Intent::Tool(call) = parse(text) else {
            panic!("expected tool intent for {text:?}");
        };
        assert_eq!(call.name, "write_file");
        assert_eq!(call.arguments.get("content"), Some(&json!("```rust\nfn main() {}\n```")));
    }

    #[test]
    fn test_trailing_text_inside_block() {
        let text = "```tool\n{\"tool\": \"time\"} extra\n```";
        assert_eq!(
            parse(text),
            Intent::Malformed("unexpected text after JSON in tool block".into())
        );
    }

    #[test]
    fn test_other_fence_tags_ignored() {
        let text = "```tools\n{\"tool\": \"add\"}\n```";
        assert_eq!(parse(text), Intent::None);
        assert_eq!(parse("```json\n{\"tool\": \"add\"}\n```"), Intent::None);
    }

    #[test]
    fn test_first_block_wins() {
        let text = "```tool\n{\"tool\": \"first\"}\n```\n```tool\n{\"tool\": \"second\"}\n```";
        let Intent::Tool(call) = parse(text) else {
            panic!("expected tool intent");
        };
        assert_eq!(call.name, "first");
    }

    #[test]
    fn test_render_parses_back() {
        let mut arguments = Arguments::new();
        arguments.insert("expression".into(), json!("2 + 2"));
        let call = ToolInvocation::new("calculate", arguments);

        assert_eq!(parse(&render(&call)), Intent::Tool(call));
    }
}
