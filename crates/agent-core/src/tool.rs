//! Tool System
//!
//! Tools are registered once at startup and invoked by the reasoning loop.
//! Registration order is kept so the prompt built from the registry is stable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::directive;
use crate::error::{AgentError, Result};

/// Tool arguments as sent by the model
pub type Arguments = serde_json::Map<String, serde_json::Value>;

/// Tool call requested by the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Tool identifier
    #[serde(rename = "tool")]
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default, alias = "parameters")]
    pub arguments: Arguments,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
}

impl ParameterSchema {
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            default: None,
            enum_values: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn with_enum(mut self, values: Vec<serde_json::Value>) -> Self {
        self.enum_values = Some(values);
        self
    }
}

/// Declared name, description and argument schema of a tool
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    #[serde(default)]
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, param: ParameterSchema) -> Self {
        self.parameters.push(param);
        self
    }

    /// Check required parameters and enum constraints
    pub fn validate(&self, arguments: &Arguments) -> std::result::Result<(), String> {
        for param in &self.parameters {
            match arguments.get(&param.name) {
                None if param.required => {
                    return Err(format!("missing required parameter: {}", param.name));
                }
                Some(value) => {
                    if let Some(allowed) = &param.enum_values {
                        if !allowed.contains(value) {
                            return Err(format!(
                                "invalid value {value} for parameter '{}'",
                                param.name
                            ));
                        }
                    }
                }
                None => {}
            }
        }
        Ok(())
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Declared schema, read once at registration
    fn spec(&self) -> ToolSpec;

    /// Run the tool. The returned text is inserted into the conversation as-is.
    async fn invoke(&self, arguments: &Arguments) -> anyhow::Result<String>;
}

/// Tool backed by a plain closure
pub struct FnTool<F> {
    spec: ToolSpec,
    func: F,
}

impl<F> FnTool<F>
where
    F: Fn(&Arguments) -> anyhow::Result<String> + Send + Sync,
{
    pub fn new(spec: ToolSpec, func: F) -> Self {
        Self { spec, func }
    }
}

#[async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(&Arguments) -> anyhow::Result<String> + Send + Sync,
{
    fn spec(&self) -> ToolSpec {
        self.spec.clone()
    }

    async fn invoke(&self, arguments: &Arguments) -> anyhow::Result<String> {
        (self.func)(arguments)
    }
}

struct Registered {
    spec: ToolSpec,
    tool: Arc<dyn Tool>,
}

/// Registry for available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Registered>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let spec = tool.spec();
        if self.index.contains_key(&spec.name) {
            return Err(AgentError::DuplicateTool(spec.name));
        }

        tracing::debug!(tool = %spec.name, "Registered tool");
        self.index.insert(spec.name.clone(), self.tools.len());
        self.tools.push(Registered { spec, tool });
        Ok(())
    }

    /// Register a closure under the given spec
    pub fn register_fn<F>(&mut self, spec: ToolSpec, func: F) -> Result<()>
    where
        F: Fn(&Arguments) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.register(FnTool::new(spec, func))
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].tool.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Run a tool by name
    pub async fn invoke(&self, name: &str, arguments: &Arguments) -> Result<String> {
        let entry = self
            .index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))?;

        entry
            .spec
            .validate(arguments)
            .map_err(|reason| AgentError::tool_execution(name, reason))?;

        entry
            .tool
            .invoke(arguments)
            .await
            .map_err(|e| AgentError::tool_execution(name, format!("{e:#}")))
    }

    /// Run a parsed tool invocation
    pub async fn execute(&self, call: &ToolInvocation) -> Result<String> {
        self.invoke(&call.name, &call.arguments).await
    }

    /// All tool specs in registration order
    pub fn describe_all(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec.clone()).collect()
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.spec.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// System prompt section describing available tools and the call format
    pub fn prompt_section(&self) -> String {
        let mut prompt = String::from("## Available Tools\n\n");
        prompt.push_str("To use a tool, respond with a block in exactly this format:\n\n");
        prompt.push_str(directive::FORMAT_EXAMPLE);
        prompt.push_str("\n\nUse at most one tool block per response. ");
        prompt.push_str("If you don't need a tool, just respond normally.\n\n");

        for spec in &self.tools {
            let spec = &spec.spec;
            let _ = writeln!(prompt, "### {}", spec.name);
            let _ = writeln!(prompt, "{}", spec.description);

            if !spec.parameters.is_empty() {
                prompt.push_str("**Parameters:**\n");
                for param in &spec.parameters {
                    let required = if param.required { " (required)" } else { "" };
                    let _ = writeln!(
                        prompt,
                        "- `{}` ({}){}: {}",
                        param.name, param.param_type, required, param.description
                    );
                }
            }
            prompt.push('\n');
        }

        prompt
    }
}
