//! Reasoning Loop
//!
//! Drives one user turn through the model, executing tool directives until the
//! model produces a plain answer or the tool budget runs out:
//!
//! ```text
//! AWAITING_INPUT → COMPOSING_PROMPT → CALLING_MODEL → PARSING_RESPONSE
//!        ↑                 ↑                                │
//!        │                 └──────── EXECUTING_TOOL ←───────┤ tool directive
//!        └──────────────────────── FINALIZING ←─────────────┘ plain answer
//! ```
//!
//! Tool failures (unknown tool, bad arguments, malformed directive) are fed
//! back to the model as tool turns. Backend failures abort the turn and keep
//! whatever it had already written.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::directive::{self, Intent};
use crate::error::{AgentError, Result};
use crate::memory::{Conversation, MemoryLimits};
use crate::message::Turn;
use crate::provider::{GenerationOptions, LlmProvider};
use crate::runtime::Runtime;
use crate::session::Session;
use crate::tool::{Tool, ToolInvocation, ToolRegistry};

/// Tool name recorded on the tool turn for an unparseable directive
pub const MALFORMED_DIRECTIVE_TOOL: &str = "tool_call";

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt template
    pub system_prompt: String,

    /// Maximum tool rounds per user turn
    pub max_tool_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Whether to append tool descriptions to system prompt
    pub inject_tool_descriptions: bool,

    /// Most recent non-pinned turns sent to the model (`None` sends everything retained)
    pub history_window: Option<usize>,

    /// Capacity of each session's memory
    pub memory: MemoryLimits,

    /// Upper bound on a single model call
    pub request_timeout: Option<Duration>,

    /// Request streamed output from the provider
    pub stream: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_tool_iterations: 5,
            generation: GenerationOptions::default(),
            inject_tool_descriptions: true,
            history_window: Some(20),
            memory: MemoryLimits::default(),
            request_timeout: Some(Duration::from_secs(120)),
            stream: false,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.generation.model.trim().is_empty() {
            return Err(AgentError::Config("model identifier is empty".into()));
        }
        if self.history_window == Some(0) {
            return Err(AgentError::Config("history window must be at least 1".into()));
        }
        if self.memory.max_turns == 0 {
            return Err(AgentError::Config("memory must retain at least 1 turn".into()));
        }
        Ok(())
    }
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant that can use tools to assist the user.

If you don't need to use a tool, just respond normally.
If a user requests something that would be better handled by a tool, use the appropriate tool.
After receiving tool results, synthesize them into a helpful response.
Always provide thoughtful, helpful responses and prioritize solving the user's problem.";

/// One executed tool round
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolRound {
    pub tool: String,
    pub output: String,
    pub success: bool,
}

/// What happened while answering one user message
#[derive(Clone, Debug)]
pub struct TurnReport {
    /// Final assistant text (also appended to the conversation)
    pub answer: String,

    /// Tool rounds executed, in order
    pub tool_rounds: Vec<ToolRound>,

    /// The loop stopped because `max_tool_iterations` was reached
    pub budget_exhausted: bool,
}

/// The main Agent struct. Shared read-only across sessions.
pub struct Agent {
    runtime: Runtime,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        let runtime = Runtime::new(provider, config.generation.clone())
            .with_timeout(config.request_timeout)
            .with_streaming(config.stream);

        Self {
            runtime,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Full system prompt including tool descriptions
    pub fn system_prompt(&self) -> String {
        self.compose_system_prompt(&self.config.system_prompt)
    }

    /// `instructions` followed by the tool descriptions, when enabled
    pub fn compose_system_prompt(&self, instructions: &str) -> String {
        let mut prompt = instructions.to_string();

        if self.config.inject_tool_descriptions && !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.tools.prompt_section());
        }

        prompt
    }

    /// Empty conversation with the pinned system prompt and configured limits
    pub fn new_conversation(&self) -> Conversation {
        Conversation::with_system_prompt(self.system_prompt(), self.config.memory)
    }

    /// New session bound to this agent's model
    pub fn start_session(&self) -> Session {
        let model = &self.config.generation.model;
        let session = Session::with_conversation(self.new_conversation(), model);
        info!(session = %session.id, model = %model, "Session started");
        session
    }

    /// Bring a stored session in line with this agent: its memory limits,
    /// system prompt and model replace whatever the session was saved with.
    pub fn adopt(&self, session: &mut Session) {
        session.conversation.set_limits(self.config.memory);
        session.conversation.set_system_prompt(self.system_prompt());
        session.metadata.model.clone_from(&self.config.generation.model);
        session.touch();
        info!(session = %session.id, turns = session.turn_count(), "Session resumed");
    }

    /// Answer one user message, returning the assistant text
    pub async fn send(&self, conversation: &mut Conversation, user_text: &str) -> Result<String> {
        self.run_turn(conversation, user_text).await.map(|report| report.answer)
    }

    /// Drop everything but the pinned system prompt
    pub fn reset(&self, conversation: &mut Conversation) {
        conversation.clear();
        if conversation.system_prompt().is_none() {
            conversation.set_system_prompt(self.system_prompt());
        }
    }

    /// Answer one user message with a report of the tool rounds.
    ///
    /// On a backend error the turn stops where it is: the user turn and any
    /// tool rounds that already ran stay in the conversation.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        user_text: &str,
    ) -> Result<TurnReport> {
        let result = self.drive(conversation, user_text).await;
        if let Err(e) = &result {
            warn!(error = %e, turns = conversation.len(), "Turn aborted");
        }
        result
    }

    async fn drive(&self, conversation: &mut Conversation, user_text: &str) -> Result<TurnReport> {
        if conversation.system_prompt().is_none() {
            conversation.set_system_prompt(self.system_prompt());
        }
        conversation.append(Turn::user(user_text));

        let max = self.config.max_tool_iterations;
        let mut rounds = Vec::new();

        loop {
            let prompt = conversation.history(self.config.history_window);
            let response = self.runtime.complete(&prompt).await?;

            let call = match directive::parse(&response) {
                Intent::None => {
                    debug!(rounds = rounds.len(), "Final answer");
                    conversation.append(Turn::assistant(response.as_str()));
                    return Ok(TurnReport {
                        answer: response,
                        tool_rounds: rounds,
                        budget_exhausted: false,
                    });
                }
                Intent::Tool(call) => Ok(call),
                Intent::Malformed(reason) => Err(AgentError::MalformedIntent(reason)),
            };

            if rounds.len() >= max {
                warn!(max, "Tool iteration budget exhausted");
                let answer = format!(
                    "I could not finish this request: {}. Please try a simpler request.",
                    AgentError::IterationBudgetExceeded(max)
                );
                conversation.append(Turn::assistant(answer.as_str()));
                return Ok(TurnReport {
                    answer,
                    tool_rounds: rounds,
                    budget_exhausted: true,
                });
            }

            conversation.append(Turn::assistant(response));

            let round = match call {
                Ok(call) => self.execute_tool(&call).await,
                Err(e) => {
                    warn!(error = %e, "Model sent a malformed tool directive");
                    ToolRound {
                        tool: MALFORMED_DIRECTIVE_TOOL.into(),
                        output: format!("Error: {e}"),
                        success: false,
                    }
                }
            };

            conversation.append(Turn::tool(round.tool.as_str(), round.output.as_str()));
            rounds.push(round);
        }
    }

    /// Run a tool, folding any failure into text for the model
    async fn execute_tool(&self, call: &ToolInvocation) -> ToolRound {
        debug!(tool = %call.name, "Executing tool");

        match self.tools.execute(call).await {
            Ok(output) => ToolRound {
                tool: call.name.clone(),
                output,
                success: true,
            },
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool failed");
                let mut output = format!("Error: {e}");
                if matches!(e, AgentError::UnknownTool(_)) {
                    output.push_str(". Available tools: ");
                    output.push_str(&self.tools.names().join(", "));
                }
                ToolRound {
                    tool: call.name.clone(),
                    output,
                    success: false,
                }
            }
        }
    }

    /// Run with a simple string input (creates temporary conversation)
    pub async fn ask(&self, question: &str) -> Result<String> {
        let mut conversation = self.new_conversation();
        self.send(&mut conversation, question).await
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get the runtime facade
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
    error: Option<AgentError>,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
            error: None,
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Add a tool; a duplicate name is reported by `build`
    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        if let Err(e) = self.tools.register(tool) {
            self.error.get_or_insert(e);
        }
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, max: u32) -> Self {
        self.config.generation.max_tokens = max;
        self
    }

    #[must_use]
    pub fn max_tool_iterations(mut self, max: usize) -> Self {
        self.config.max_tool_iterations = max;
        self
    }

    #[must_use]
    pub fn history_window(mut self, window: Option<usize>) -> Self {
        self.config.history_window = window;
        self
    }

    #[must_use]
    pub fn memory(mut self, limits: MemoryLimits) -> Self {
        self.config.memory = limits;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn stream(mut self, stream: bool) -> Self {
        self.config.stream = stream;
        self
    }

    pub fn build(self) -> Result<Agent> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.config.validate()?;

        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}
