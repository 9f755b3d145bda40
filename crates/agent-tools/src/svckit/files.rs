//! File Tools
//!
//! `write_file` / `read_file`. I/O failures come back as tool output text
//! so the model can read them and adjust, rather than as tool errors.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use agent_core::{Arguments, ParameterSchema, Tool, ToolSpec};
use async_trait::async_trait;

use super::string_arg;
use crate::error::{Result, ToolError};

/// Where relative filenames resolve. With a root set, paths may not leave it.
#[derive(Clone, Debug, Default)]
struct FileRoot(Option<PathBuf>);

impl FileRoot {
    fn resolve(&self, filename: &str) -> Result<PathBuf> {
        let Some(root) = &self.0 else {
            return Ok(PathBuf::from(filename));
        };

        let path = Path::new(filename);
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if escapes {
            return Err(ToolError::PathOutsideRoot(filename.to_string()));
        }
        Ok(root.join(path))
    }
}

/// Writes text content to a file, replacing it if present
#[derive(Clone, Debug, Default)]
pub struct WriteFileTool {
    root: FileRoot,
}

impl WriteFileTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Confine writes to `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: FileRoot(Some(root.into())),
        }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("write_file", "Write content to a file")
            .param(ParameterSchema::required("content", "string", "The content to write"))
            .param(ParameterSchema::required("filename", "string", "The file to write to"))
    }

    async fn invoke(&self, arguments: &Arguments) -> anyhow::Result<String> {
        let content = string_arg(arguments, "content")?;
        let filename = string_arg(arguments, "filename")?;

        let written = match self.root.resolve(&filename) {
            Ok(path) => tokio::fs::write(&path, content.as_bytes())
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        Ok(match written {
            Ok(()) => {
                tracing::debug!(file = %filename, bytes = content.len(), "File written");
                format!("Successfully wrote content to {filename}")
            }
            Err(e) => format!("Error writing to file: {e}"),
        })
    }
}

/// Reads a text file
#[derive(Clone, Debug, Default)]
pub struct ReadFileTool {
    root: FileRoot,
}

impl ReadFileTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Confine reads to `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: FileRoot(Some(root.into())),
        }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("read_file", "Read content from a file").param(ParameterSchema::required(
            "filename",
            "string",
            "The file to read from",
        ))
    }

    async fn invoke(&self, arguments: &Arguments) -> anyhow::Result<String> {
        let filename = string_arg(arguments, "filename")?;

        let path = match self.root.resolve(&filename) {
            Ok(path) => path,
            Err(e) => return Ok(format!("Error reading file: {e}")),
        };

        Ok(match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => format!("File not found: {filename}"),
            Err(e) => format!("Error reading file: {e}"),
        })
    }
}
