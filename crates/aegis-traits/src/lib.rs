//! Narrow trait contracts at the seams between aegis-core and its pluggable
//! collaborators: tools, the LLM backend, governance, and optional local
//! storage integrations.

pub mod approval;
pub mod error;
pub mod governance;
pub mod llm;
pub mod store;
pub mod tool;

pub use approval::{ApprovalChannel, ApprovalOutcome};
pub use error::{Result, TraitError};
pub use governance::{GovernanceGate, ToolAction};
pub use llm::{CompletionRequest, CompletionResponse, FinishReason, LlmClient, TokenUsage};
pub use store::{GraphStore, SearchSink, SessionStore, ToolGateway};
pub use tool::Tool;
