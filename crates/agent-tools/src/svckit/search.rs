//! Web Search Tool

use std::fmt::Write as _;
use std::sync::Arc;

use agent_core::{Arguments, ParameterSchema, Tool, ToolSpec};
use async_trait::async_trait;

use super::string_arg;
use crate::backend::{MockSearch, SearchBackend};

/// Searches through a [`SearchBackend`]
pub struct SearchTool {
    name: &'static str,
    description: &'static str,
    backend: Arc<dyn SearchBackend>,
}

impl SearchTool {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self::named("search", "Search the web for information", backend)
    }

    /// Same search behavior registered under another tool name
    pub fn named(
        name: &'static str,
        description: &'static str,
        backend: Arc<dyn SearchBackend>,
    ) -> Self {
        Self {
            name,
            description,
            backend,
        }
    }
}

impl Default for SearchTool {
    fn default() -> Self {
        Self::new(Arc::new(MockSearch))
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(self.name, self.description).param(ParameterSchema::required(
            "query",
            "string",
            "The search query",
        ))
    }

    async fn invoke(&self, arguments: &Arguments) -> anyhow::Result<String> {
        let query = string_arg(arguments, "query")?;
        let results = self.backend.search(&query).await?;

        let mut output = format!("{} search results for: {query}", self.backend.name());
        if results.is_empty() {
            output.push_str("\nNo results.");
        }
        for (i, title) in results.iter().enumerate() {
            let _ = write!(output, "\n{}. {title}", i + 1);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockPapers;
    use serde_json::json;

    #[tokio::test]
    async fn test_search_lists_numbered_results() {
        let args = json!({"query": "ollama"}).as_object().cloned().unwrap();
        let output = SearchTool::default().invoke(&args).await.unwrap();
        assert_eq!(
            output,
            "Mock search results for: ollama\n1. First result\n2. Second result\n3. Third result"
        );
    }

    #[tokio::test]
    async fn test_named_search_uses_its_backend() {
        let tool = SearchTool::named(
            "academic_search",
            "Search for academic papers",
            Arc::new(MockPapers),
        );
        assert_eq!(tool.spec().name, "academic_search");

        let args = json!({"query": "qubits"}).as_object().cloned().unwrap();
        let output = tool.invoke(&args).await.unwrap();
        assert!(output.starts_with("Mock academic search results for: qubits\n1. "));
        assert_eq!(output.lines().count(), 4);
    }
}
