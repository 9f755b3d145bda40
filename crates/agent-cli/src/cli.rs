//! Command Line Arguments

use std::path::PathBuf;
use std::time::Duration;

use agent_core::memory::MemoryLimits;
use agent_core::{AgentConfig, GenerationOptions};
use agent_tools::{Personality, Preset};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ollama-agent")]
#[command(about = "Tool-using agent on a local Ollama model", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Model to use
    #[arg(long, env = "AGENT_MODEL", default_value = "llama3", global = true)]
    pub model: String,

    /// Agent preset: general, research, coding or chat
    #[arg(long, default_value = "general")]
    pub agent: Preset,

    /// Chat preset tone: friendly, professional, creative or supportive
    #[arg(long, default_value = "friendly")]
    pub personality: Personality,

    /// Tool rounds allowed per message
    #[arg(long, default_value_t = 5)]
    pub max_tool_iterations: usize,

    /// Recent turns sent to the model (0 sends all retained turns)
    #[arg(long, default_value_t = 20)]
    pub history_window: usize,

    /// Turns kept in memory, system prompt excluded
    #[arg(long, default_value_t = 50)]
    pub max_turns: usize,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    /// Replace the preset's system prompt
    #[arg(long, env = "AGENT_SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,

    /// Request streamed output from Ollama
    #[arg(long)]
    pub stream: bool,

    /// Seconds to wait for one model response
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,

    /// Keep sessions as JSON files in this directory, saved after every turn
    #[arg(long, env = "AGENT_SESSION_DIR", global = true)]
    pub session_dir: Option<PathBuf>,

    /// Continue a stored session by id, or `latest`
    #[arg(long, requires = "session_dir")]
    pub resume: Option<String>,

    /// Confine the file tools to this directory
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Print tool rounds and debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Interactive chat (default)
    Chat,
    /// List models installed in Ollama
    Models,
    /// List stored sessions, most recent first
    Sessions,
}

impl Cli {
    pub fn agent_config(&self) -> AgentConfig {
        let defaults = AgentConfig::default();

        AgentConfig {
            system_prompt: self
                .system_prompt
                .clone()
                .unwrap_or_else(|| self.agent.instructions(self.personality)),
            max_tool_iterations: self.max_tool_iterations,
            generation: GenerationOptions {
                model: self.model.clone(),
                temperature: self.temperature,
                ..GenerationOptions::default()
            },
            history_window: (self.history_window > 0).then_some(self.history_window),
            memory: MemoryLimits {
                max_turns: self.max_turns,
                ..MemoryLimits::default()
            },
            request_timeout: Some(Duration::from_secs(self.timeout)),
            stream: self.stream,
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::reasoning::DEFAULT_SYSTEM_PROMPT;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["ollama-agent"]).unwrap();
        assert_eq!(cli.command, None);

        let config = cli.agent_config();
        assert_eq!(config.max_tool_iterations, 5);
        assert_eq!(config.history_window, Some(20));
        assert_eq!(config.memory.max_turns, 50);
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_reach_agent_config() {
        let cli = Cli::try_parse_from([
            "ollama-agent",
            "--model",
            "mistral",
            "--max-tool-iterations",
            "2",
            "--history-window",
            "0",
            "--stream",
            "--system-prompt",
            "Be brief.",
        ])
        .unwrap();

        let config = cli.agent_config();
        assert_eq!(config.generation.model, "mistral");
        assert_eq!(config.max_tool_iterations, 2);
        assert_eq!(config.history_window, None);
        assert!(config.stream);
        assert_eq!(config.system_prompt, "Be brief.");
    }

    #[test]
    fn test_models_subcommand() {
        let cli = Cli::try_parse_from(["ollama-agent", "models", "-v"]).unwrap();
        assert_eq!(cli.command, Some(Command::Models));
        assert!(cli.verbose);
    }

    #[test]
    fn test_preset_flags() {
        let cli = Cli::try_parse_from([
            "ollama-agent",
            "--agent",
            "chat",
            "--personality",
            "creative",
        ])
        .unwrap();
        assert_eq!(cli.agent, Preset::Chat);
        assert!(cli.agent_config().system_prompt.starts_with("You are creative"));

        let cli = Cli::try_parse_from(["ollama-agent", "--agent", "research"]).unwrap();
        assert!(cli.agent_config().system_prompt.contains("google_search"));

        assert!(Cli::try_parse_from(["ollama-agent", "--agent", "wizard"]).is_err());
    }

    #[test]
    fn test_resume_needs_session_dir() {
        assert!(Cli::try_parse_from(["ollama-agent", "--resume", "latest"]).is_err());

        let cli = Cli::try_parse_from([
            "ollama-agent",
            "--session-dir",
            "sessions",
            "--resume",
            "latest",
        ])
        .unwrap();
        assert_eq!(cli.resume.as_deref(), Some("latest"));
    }
}
