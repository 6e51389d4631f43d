pub mod key_rotator;
pub mod prompt_builder;
pub mod retry;
pub mod review_service;
pub mod review_writer;

pub use key_rotator::{KeyRotator, WrapRule};
pub use prompt_builder::{Language, PromptBuilder, ReviewPrompt, TokenBudget, TruncationMode};
pub use retry::{RetryOutcome, RetryPolicy};
pub use review_service::{ChatBackend, ChatReply, OpenAiBackend, ReviewClient, ReviewReply, TokenUsage};
pub use review_writer::{sanitize_title, ReviewWriter};
