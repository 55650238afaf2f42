//! Retry decorator: wraps any `LlmClient` with bounded exponential backoff,
//! so the Task Executor's `UpstreamUnavailable` handling doesn't need to
//! know which concrete backend it's talking to.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use aegis_traits::llm::{CompletionRequest, CompletionResponse, LlmClient};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay = (self.initial_delay_ms as f64 * multiplier) as u64;
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

pub struct RetryingLlmClient {
    inner: Arc<dyn LlmClient>,
    config: RetryConfig,
}

impl RetryingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn with_default_config(inner: Arc<dyn LlmClient>) -> Self {
        Self::new(inner, RetryConfig::default())
    }
}

#[async_trait]
impl LlmClient for RetryingLlmClient {
    fn provider(&self) -> &str {
        self.inner.provider()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> aegis_traits::Result<CompletionResponse> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    if attempt == self.config.max_retries {
                        return Err(error);
                    }
                    let delay = self.config.delay_for(attempt + 1);
                    tracing::warn!(
                        provider = self.inner.provider(),
                        model = self.inner.model(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying LLM request"
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.expect("loop always sets an error before exhausting retries"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{MockLlmClient, MockStep};
    use aegis_models::Message;

    #[tokio::test]
    async fn succeeds_without_retry_when_first_call_works() {
        let mock = MockLlmClient::from_steps("m", vec![MockStep::text("ok")]);
        let client = RetryingLlmClient::with_default_config(Arc::new(mock));
        let response = client
            .complete(CompletionRequest::new(vec![Message::user("hi")]))
            .await
            .unwrap();
        assert_eq!(response.content.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let mock = MockLlmClient::from_steps(
            "m",
            vec![MockStep::error("transient"), MockStep::text("ok")],
        );
        let config = RetryConfig {
            initial_delay_ms: 1,
            max_delay_ms: 2,
            ..RetryConfig::default()
        };
        let client = RetryingLlmClient::new(Arc::new(mock), config);
        let response = client
            .complete(CompletionRequest::new(vec![Message::user("hi")]))
            .await
            .unwrap();
        assert_eq!(response.content.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let mock = MockLlmClient::from_steps(
            "m",
            vec![
                MockStep::error("a"),
                MockStep::error("b"),
                MockStep::error("c"),
                MockStep::error("d"),
            ],
        );
        let config = RetryConfig {
            max_retries: 3,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            ..RetryConfig::default()
        };
        let client = RetryingLlmClient::new(Arc::new(mock), config);
        let result = client
            .complete(CompletionRequest::new(vec![Message::user("hi")]))
            .await;
        assert!(result.is_err());
    }
}
