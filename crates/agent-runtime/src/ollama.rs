//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference.

use agent_core::{
    error::{AgentError, Result},
    message::{Role, Turn},
    provider::{
        Completion, CompletionStream, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo,
        StreamChunk,
    },
};
use async_trait::async_trait;
use futures::StreamExt;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, MessageRole, request::ChatMessageRequest},
    models::ModelOptions,
};
use serde::{Deserialize, Serialize};

const DEFAULT_HOST: &str = "http://localhost";
const DEFAULT_PORT: u16 = 11434;

/// Ollama provider configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
        }
    }
}

impl OllamaConfig {
    /// Read `OLLAMA_HOST` / `OLLAMA_PORT`.
    ///
    /// `OLLAMA_HOST` may carry its own port (`127.0.0.1:11434`), as the
    /// Ollama CLI accepts; an explicit `OLLAMA_PORT` wins over it.
    pub fn from_env() -> Self {
        let (host, host_port) = std::env::var("OLLAMA_HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .map_or_else(|| (DEFAULT_HOST.to_string(), None), |h| split_host(&h));
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .or(host_port)
            .unwrap_or(DEFAULT_PORT);

        Self { host, port }
    }

    /// `host:port` form, for display
    pub fn base_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Normalise a host value into `scheme://host` plus an optional port.
fn split_host(raw: &str) -> (String, Option<u16>) {
    let raw = raw.trim().trim_end_matches('/');
    let (scheme, rest) = raw
        .split_once("://")
        .map_or(("http", raw), |(scheme, rest)| (scheme, rest));

    match rest.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => match port.parse::<u16>() {
            Ok(port) => (format!("{scheme}://{host}"), Some(port)),
            Err(_) => (format!("{scheme}://{rest}"), None),
        },
        _ => (format!("{scheme}://{rest}"), None),
    }
}

/// Sort an ollama-rs failure into "backend not reachable" or "backend said no".
fn classify<E>(err: &E) -> AgentError
where
    E: std::error::Error + 'static,
{
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        if let Some(http) = current.downcast_ref::<reqwest::Error>() {
            if http.is_connect() || http.is_timeout() {
                return AgentError::BackendUnavailable(err.to_string());
            }
        }
        source = current.source();
    }
    AgentError::Generation(err.to_string())
}

/// A stream that broke after it started; `detail` is whatever the client reported
fn stream_interrupted(detail: &impl std::fmt::Debug) -> AgentError {
    AgentError::Generation(format!("Ollama stream interrupted: {detail:?}"))
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Ollama,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider with custom host/port
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        Self::from_config(OllamaConfig {
            host: host.into(),
            port,
        })
    }

    /// Create from configuration
    pub fn from_config(config: OllamaConfig) -> Result<Self> {
        // ollama-rs panics on a URL it cannot parse
        reqwest::Url::parse(&config.host).map_err(|e| {
            AgentError::Config(format!("invalid Ollama host '{}': {e}", config.host))
        })?;

        Ok(Self {
            client: Ollama::new(config.host.clone(), config.port),
            config,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OllamaConfig::from_env())
    }

    /// Create with default localhost settings
    pub fn localhost() -> Self {
        Self {
            client: Ollama::default(),
            config: OllamaConfig::default(),
        }
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Convert turns to Ollama chat messages.
    ///
    /// Ollama has no tool role for free-form results, so tool turns go in
    /// as user context labelled with the tool name.
    fn convert_messages(messages: &[Turn]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|turn| match turn.role() {
                Role::System => ChatMessage::new(MessageRole::System, turn.content().to_string()),
                Role::User => ChatMessage::new(MessageRole::User, turn.content().to_string()),
                Role::Assistant => {
                    ChatMessage::new(MessageRole::Assistant, turn.content().to_string())
                }
                Role::Tool => ChatMessage::new(MessageRole::User, render_tool_turn(turn)),
            })
            .collect()
    }

    /// Build Ollama model options
    fn build_options(opts: &GenerationOptions) -> ModelOptions {
        let options = ModelOptions::default()
            .temperature(opts.temperature)
            .top_p(opts.top_p)
            .num_predict(i32::try_from(opts.max_tokens).unwrap_or(i32::MAX));

        if opts.stop_sequences.is_empty() {
            options
        } else {
            options.stop(opts.stop_sequences.clone())
        }
    }

    fn request(messages: &[Turn], options: &GenerationOptions) -> ChatMessageRequest {
        ChatMessageRequest::new(options.model.clone(), Self::convert_messages(messages))
            .options(Self::build_options(options))
    }
}

fn render_tool_turn(turn: &Turn) -> String {
    format!(
        "[Tool '{}' output]\n{}",
        turn.tool_name().unwrap_or("unknown"),
        turn.content()
    )
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: "Ollama".into(),
            models,
            supports_streaming: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.list_local_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!(url = %self.config.base_url(), "Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(&self, messages: &[Turn], options: &GenerationOptions) -> Result<Completion> {
        tracing::debug!(model = %options.model, turns = messages.len(), "Ollama chat request");

        let response = self
            .client
            .send_chat_messages(Self::request(messages, options))
            .await
            .map_err(|e| classify(&e))?;

        Ok(Completion {
            content: response.message.content,
            model: options.model.clone(),
        })
    }

    async fn complete_stream(
        &self,
        messages: &[Turn],
        options: &GenerationOptions,
    ) -> Result<CompletionStream> {
        tracing::debug!(model = %options.model, turns = messages.len(), "Ollama streaming request");

        let stream = self
            .client
            .send_chat_messages_stream(Self::request(messages, options))
            .await
            .map_err(|e| classify(&e))?;

        let mapped = stream.map(|result| {
            result
                .map(|chunk| StreamChunk {
                    delta: chunk.message.content,
                    done: chunk.done,
                })
                .map_err(|e| stream_interrupted(&e))
        });

        Ok(Box::pin(mapped))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let models = self
            .client
            .list_local_models()
            .await
            .map_err(|e| classify(&e))?;

        Ok(models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name.clone(),
                name: m.name,
                size: Some(m.size),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.host, "http://localhost");
        assert_eq!(config.port, 11434);
        assert_eq!(config.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_split_host() {
        assert_eq!(split_host("http://localhost"), ("http://localhost".into(), None));
        assert_eq!(split_host("127.0.0.1:11500"), ("http://127.0.0.1".into(), Some(11500)));
        assert_eq!(
            split_host("https://ollama.internal:8443/"),
            ("https://ollama.internal".into(), Some(8443))
        );
        assert_eq!(split_host("gpu-box"), ("http://gpu-box".into(), None));
    }

    #[test]
    fn test_invalid_host_is_config_error() {
        let err = OllamaProvider::new("not a url", 11434).err().unwrap();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_message_conversion() {
        let messages = vec![
            Turn::system("You are helpful."),
            Turn::user("Hello"),
            Turn::assistant("```tool\n{\"tool\": \"time\"}\n```"),
            Turn::tool("time", "12:00"),
        ];

        let converted = OllamaProvider::convert_messages(&messages);
        assert_eq!(converted.len(), 4);
        assert_eq!(converted[3].content, "[Tool 'time' output]\n12:00");
        assert!(matches!(converted[3].role, MessageRole::User));
        assert!(matches!(converted[0].role, MessageRole::System));
    }

    #[test]
    fn test_non_transport_errors_are_generation_failures() {
        let err = std::io::Error::other("model 'nope' not found");
        assert!(matches!(classify(&err), AgentError::Generation(_)));
    }

    #[test]
    fn test_stream_errors_keep_detail() {
        let err = stream_interrupted(&std::io::Error::other("connection reset by peer"));
        let AgentError::Generation(msg) = &err else {
            panic!("expected a generation error, got {err:?}");
        };
        assert!(msg.contains("connection reset by peer"));
        assert!(err.to_string().contains("stream interrupted"));
    }

    #[tokio::test]
    async fn test_refused_connection_is_backend_unavailable() {
        let err = reqwest::get("http://127.0.0.1:1/").await.unwrap_err();
        assert!(matches!(classify(&err), AgentError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_health_check_reports_unreachable_backend() {
        let provider = OllamaProvider::new("http://127.0.0.1", 1).unwrap();
        assert!(!provider.health_check().await.unwrap());
    }
}
