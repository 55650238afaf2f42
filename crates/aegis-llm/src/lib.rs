//! Model routing and LLM adapter implementations: the heuristic-first
//! router that picks a `ModelRole` per request, and the concrete
//! `LlmClient` backends (mock, OpenAI-compatible HTTP, retry decorator).

pub mod error;
pub mod llm;
pub mod model_router;

pub use error::{LlmError, Result};
pub use llm::{MockLlmClient, MockStep, OpenAiCompatClient, RetryConfig, RetryingLlmClient};
pub use model_router::{route, RouterConfig, RoutingPolicy};
