//! Runtime Facade
//!
//! Presents a provider as a single `complete(messages) -> text` call with the
//! agent's generation options applied. Streamed output is reassembled here so
//! the reasoning loop only ever sees whole responses.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::message::Turn;
use crate::provider::{GenerationOptions, LlmProvider};

pub struct Runtime {
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
    timeout: Option<Duration>,
    stream: bool,
}

impl Runtime {
    pub fn new(provider: Arc<dyn LlmProvider>, options: GenerationOptions) -> Self {
        Self {
            provider,
            options,
            timeout: None,
            stream: false,
        }
    }

    /// Bound each model call; expiry is reported as `BackendUnavailable`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use the provider's streaming endpoint
    #[must_use]
    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Send the composed turns to the model and return its text
    pub async fn complete(&self, messages: &[Turn]) -> Result<String> {
        tracing::debug!(
            model = %self.options.model,
            messages = messages.len(),
            stream = self.stream,
            "Calling model"
        );

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.call(messages))
                .await
                .map_err(|_| {
                    AgentError::BackendUnavailable(format!(
                        "model call timed out after {}ms",
                        limit.as_millis()
                    ))
                })?,
            None => self.call(messages).await,
        }
    }

    async fn call(&self, messages: &[Turn]) -> Result<String> {
        if !self.stream {
            let completion = self.provider.complete(messages, &self.options).await?;
            return Ok(completion.content);
        }

        let mut stream = self.provider.complete_stream(messages, &self.options).await?;
        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            text.push_str(&chunk.delta);
            if chunk.done {
                break;
            }
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Completion, CompletionStream, ModelInfo, ProviderInfo, StreamChunk};
    use async_trait::async_trait;

    struct ChunkedProvider {
        delay: Duration,
    }

    #[async_trait]
    impl LlmProvider for ChunkedProvider {
        async fn info(&self) -> Result<ProviderInfo> {
            Ok(ProviderInfo {
                name: "chunked".into(),
                models: Vec::new(),
                supports_streaming: true,
            })
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(&self, _: &[Turn], options: &GenerationOptions) -> Result<Completion> {
            tokio::time::sleep(self.delay).await;
            Ok(Completion {
                content: "whole".into(),
                model: options.model.clone(),
            })
        }

        async fn complete_stream(
            &self,
            _: &[Turn],
            _: &GenerationOptions,
        ) -> Result<CompletionStream> {
            let chunks = ["Hel", "lo", "!", "ignored"]
                .iter()
                .enumerate()
                .map(|(i, delta)| {
                    Ok(StreamChunk {
                        delta: (*delta).to_string(),
                        done: i == 2,
                    })
                })
                .collect::<Vec<Result<StreamChunk>>>();
            Ok(Box::pin(futures::stream::iter(chunks)))
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    fn runtime(delay_ms: u64) -> Runtime {
        Runtime::new(
            Arc::new(ChunkedProvider {
                delay: Duration::from_millis(delay_ms),
            }),
            GenerationOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_plain_completion() {
        let text = runtime(0).complete(&[Turn::user("hi")]).await.unwrap();
        assert_eq!(text, "whole");
    }

    #[tokio::test]
    async fn test_stream_is_reassembled() {
        let rt = runtime(0).with_streaming(true);
        let text = rt.complete(&[Turn::user("hi")]).await.unwrap();
        assert_eq!(text, "Hello!");
    }

    #[tokio::test]
    async fn test_timeout_is_backend_unavailable() {
        let rt = runtime(500).with_timeout(Some(Duration::from_millis(10)));
        let err = rt.complete(&[Turn::user("hi")]).await.unwrap_err();
        assert!(matches!(err, AgentError::BackendUnavailable(_)));
    }
}
