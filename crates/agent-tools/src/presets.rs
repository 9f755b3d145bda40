//! Agent Presets
//!
//! Ready-made agents for research, coding and chat. A preset is a set of
//! instructions plus the tools that go with them; the standard six tools
//! are always included.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use agent_core::reasoning::DEFAULT_SYSTEM_PROMPT;
use agent_core::ToolRegistry;

use crate::backend::{MockPapers, MockSearch};
use crate::error::ToolError;
use crate::svckit::{DocsTool, FixTool, RunCodeTool, SearchTool, SummarizeTool};

const RESEARCH_INSTRUCTIONS: &str = "You are a research assistant that helps users find and process information.
Aim for accurate, well-sourced answers on any topic.

For research questions:
1. Search for relevant information with the tools provided
2. Analyze and combine what you find
3. Present the findings clearly and in order
4. Cite your sources
5. Say where the available information is thin or missing

Pick the tool that fits: google_search for general information, academic_search for papers, summarize to condense long text.
Keep facts and opinions apart.";

const CODING_INSTRUCTIONS: &str = "You are a coding assistant that helps users write, debug and understand code.
Aim for clear, efficient, documented solutions.

When helping with code:
1. Make sure you understand the requirements before writing anything
2. Write clean, readable code
3. Comment where the logic is not obvious
4. Explain how the code works
5. Follow the conventions of the language in use

Pick the tool that fits: docs for language or library documentation, run to try code, fix to track down errors.
Put code in fenced blocks tagged with the language.";

const CHAT_GUIDELINES: &str = "As a conversational assistant, your main goal is natural, helpful dialogue.

Guidelines:
1. Respond directly to what the user said
2. Keep track of context across the conversation
3. Ask clarifying questions when something is unclear
4. Stay concise unless the user asks for detail
5. Be respectful and considerate

Keep the conversation flowing; avoid stiff or robotic replies.";

/// Which ready-made agent to run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Preset {
    /// Standard tools, general-purpose instructions
    #[default]
    General,
    Research,
    Coding,
    Chat,
}

impl Preset {
    pub const ALL: [Self; 4] = [Self::General, Self::Research, Self::Coding, Self::Chat];

    pub const fn name(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Research => "research",
            Self::Coding => "coding",
            Self::Chat => "chat",
        }
    }

    /// System instructions; `personality` only affects the chat preset
    pub fn instructions(self, personality: Personality) -> String {
        match self {
            Self::General => DEFAULT_SYSTEM_PROMPT.to_string(),
            Self::Research => RESEARCH_INSTRUCTIONS.to_string(),
            Self::Coding => CODING_INSTRUCTIONS.to_string(),
            Self::Chat => chat_instructions(personality),
        }
    }

    /// The standard tools plus this preset's own, with file access confined
    /// to `file_root` when given
    pub fn registry(self, file_root: Option<PathBuf>) -> agent_core::Result<ToolRegistry> {
        let mut registry = match file_root {
            Some(root) => crate::standard_registry_in(root)?,
            None => crate::standard_registry()?,
        };

        match self {
            Self::General | Self::Chat => {}
            Self::Research => {
                registry.register(SearchTool::named(
                    "google_search",
                    "Search Google for information",
                    Arc::new(MockSearch),
                ))?;
                registry.register(SearchTool::named(
                    "academic_search",
                    "Search for academic papers",
                    Arc::new(MockPapers),
                ))?;
                registry.register(SummarizeTool)?;
            }
            Self::Coding => {
                registry.register(DocsTool)?;
                registry.register(RunCodeTool)?;
                registry.register(FixTool)?;
            }
        }

        tracing::debug!(preset = self.name(), tools = registry.len(), "Preset tools registered");
        Ok(registry)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| unknown("agent", s, Self::ALL.map(Self::name)))
    }
}

/// Tone of the chat preset
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Personality {
    #[default]
    Friendly,
    Professional,
    Creative,
    Supportive,
}

impl Personality {
    pub const ALL: [Self; 4] = [
        Self::Friendly,
        Self::Professional,
        Self::Creative,
        Self::Supportive,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Friendly => "friendly",
            Self::Professional => "professional",
            Self::Creative => "creative",
            Self::Supportive => "supportive",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Friendly => {
                "You are friendly, warm and engaging. You use a conversational tone with the occasional joke."
            }
            Self::Professional => {
                "You are professional, clear and concise. You keep a formal tone and put accuracy first."
            }
            Self::Creative => {
                "You are creative and imaginative. You use vivid language, metaphors and fresh perspectives."
            }
            Self::Supportive => {
                "You are supportive and empathetic. You acknowledge feelings and offer encouragement."
            }
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Personality {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| unknown("personality", s, Self::ALL.map(Self::name)))
    }
}

/// Chat instructions in the given personality
pub fn chat_instructions(personality: Personality) -> String {
    format!("{}\n\n{CHAT_GUIDELINES}", personality.description())
}

fn unknown(kind: &'static str, name: &str, available: [&str; 4]) -> ToolError {
    ToolError::UnknownName {
        kind,
        name: name.trim().to_string(),
        available: available.join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_tool_sets() {
        let standard = ["search", "weather", "time", "write_file", "read_file", "calculate"];

        let general = Preset::General.registry(None).unwrap();
        assert_eq!(general.names(), standard);
        assert_eq!(Preset::Chat.registry(None).unwrap().names(), standard);

        let research = Preset::Research.registry(None).unwrap();
        assert_eq!(&research.names()[6..], ["google_search", "academic_search", "summarize"]);

        let coding = Preset::Coding.registry(None).unwrap();
        assert_eq!(&coding.names()[6..], ["docs", "run", "fix"]);
    }

    #[test]
    fn test_instructions() {
        let research = Preset::Research.instructions(Personality::default());
        assert!(research.contains("academic_search"));
        assert_eq!(Preset::General.instructions(Personality::Creative), DEFAULT_SYSTEM_PROMPT);

        let chat = Preset::Chat.instructions(Personality::Professional);
        assert!(chat.starts_with("You are professional"));
        assert!(chat.contains("Guidelines:"));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(" Coding ".parse::<Preset>().unwrap(), Preset::Coding);
        assert_eq!("SUPPORTIVE".parse::<Personality>().unwrap(), Personality::Supportive);

        let err = "grumpy".parse::<Personality>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown personality 'grumpy'. Available: friendly, professional, creative, supportive"
        );
        assert!("wizard".parse::<Preset>().is_err());
    }

    #[tokio::test]
    async fn test_research_tools_answer() {
        let registry = Preset::Research.registry(None).unwrap();
        let args = serde_json::json!({"query": "qubits"});
        let output = registry
            .invoke("google_search", args.as_object().unwrap())
            .await
            .unwrap();
        assert!(output.starts_with("Mock search results for: qubits"));
    }
}
