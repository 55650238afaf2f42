//! Deterministic mock LLM client for tests: scripted steps consumed in
//! order, falling back to an echo response once the script runs dry.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

use aegis_models::{Role, ToolCall};
use aegis_traits::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmClient, TokenUsage};
use aegis_traits::TraitError;

#[derive(Debug, Clone)]
pub enum MockStepKind {
    Text(String),
    ToolCall {
        id: String,
        name: String,
        arguments: Value,
    },
    Error(String),
    Timeout(u64),
}

#[derive(Debug, Clone)]
pub struct MockStep {
    pub kind: MockStepKind,
}

impl MockStep {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: MockStepKind::Text(content.into()),
        }
    }

    pub fn tool_call(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            kind: MockStepKind::ToolCall {
                id: id.into(),
                name: name.into(),
                arguments,
            },
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: MockStepKind::Error(message.into()),
        }
    }

    pub fn timeout(delay_ms: u64) -> Self {
        Self {
            kind: MockStepKind::Timeout(delay_ms),
        }
    }
}

/// A deterministic mock LLM client driven by a scripted queue of steps.
#[derive(Clone, Default)]
pub struct MockLlmClient {
    model: String,
    script: Arc<Mutex<VecDeque<MockStep>>>,
}

impl MockLlmClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn from_steps(model: impl Into<String>, steps: Vec<MockStep>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
        }
    }

    pub async fn push_step(&self, step: MockStep) {
        self.script.lock().await.push_back(step);
    }

    fn fallback_response(request: &CompletionRequest) -> CompletionResponse {
        let text = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| format!("mock-echo: {}", m.content))
            .unwrap_or_else(|| "mock-ok".to_string());
        CompletionResponse {
            content: Some(text),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
            usage: Some(TokenUsage::default()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> aegis_traits::Result<CompletionResponse> {
        let step = self.script.lock().await.pop_front();
        let Some(step) = step else {
            return Ok(Self::fallback_response(&request));
        };

        match step.kind {
            MockStepKind::Text(content) => Ok(CompletionResponse {
                content: Some(content),
                tool_calls: Vec::new(),
                finish_reason: FinishReason::Stop,
                usage: Some(TokenUsage::default()),
            }),
            MockStepKind::ToolCall {
                id,
                name,
                arguments,
            } => Ok(CompletionResponse {
                content: None,
                tool_calls: vec![ToolCall {
                    id,
                    name,
                    arguments,
                }],
                finish_reason: FinishReason::ToolCalls,
                usage: Some(TokenUsage::default()),
            }),
            MockStepKind::Error(message) => Err(TraitError::LlmRequestFailed("mock".into(), message)),
            MockStepKind::Timeout(delay_ms) => {
                sleep(Duration::from_millis(delay_ms)).await;
                Err(TraitError::LlmRequestFailed(
                    "mock".into(),
                    "mock timeout".into(),
                ))
            }
        }
    }
}
