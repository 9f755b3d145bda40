//! # agent-tools
//!
//! Built-in tools for agent-core: web search, weather, time, file
//! read/write and a calculator, plus the research, coding and chat
//! presets built on top of them.
//!
//! ```rust,ignore
//! let tools = agent_tools::standard_registry()?;
//! let agent = AgentBuilder::new()
//!     .provider(provider)
//!     .tools(tools)
//!     .build()?;
//! ```
//!
//! Search and weather run on mock backends; swap in a real data source by
//! implementing [`backend::SearchBackend`] or [`backend::WeatherBackend`].

pub mod backend;
pub mod error;
pub mod expr;
pub mod presets;
pub mod svckit;

use std::path::PathBuf;

use agent_core::ToolRegistry;

pub use error::{Result, ToolError};
pub use presets::{Personality, Preset};
pub use svckit::{
    CalculatorTool, DocsTool, FixTool, ReadFileTool, RunCodeTool, SearchTool, SummarizeTool,
    TimeTool, WeatherTool, WriteFileTool,
};

/// All six built-in tools, in prompt order.
pub fn standard_registry() -> agent_core::Result<ToolRegistry> {
    build_registry(WriteFileTool::new(), ReadFileTool::new())
}

/// Same tools, with file access confined to `root`.
pub fn standard_registry_in(root: impl Into<PathBuf>) -> agent_core::Result<ToolRegistry> {
    let root = root.into();
    build_registry(
        WriteFileTool::with_root(root.clone()),
        ReadFileTool::with_root(root),
    )
}

fn build_registry(
    writer: WriteFileTool,
    reader: ReadFileTool,
) -> agent_core::Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(SearchTool::default())?;
    registry.register(WeatherTool::default())?;
    registry.register(TimeTool)?;
    registry.register(writer)?;
    registry.register(reader)?;
    registry.register(CalculatorTool)?;
    Ok(registry)
}
