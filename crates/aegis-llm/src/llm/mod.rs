pub mod mock;
pub mod openai_compat;
pub mod retry;

pub use mock::{MockLlmClient, MockStep};
pub use openai_compat::OpenAiCompatClient;
pub use retry::{RetryConfig, RetryingLlmClient};
