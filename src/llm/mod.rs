//! LLM module - Language Model integrations
//!
//! Backs the action planner and the semantic asserter, with Ollama as the
//! provider.

pub mod ollama;
pub mod traits;
pub mod types;

pub use ollama::OllamaClient;
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};
pub use types::{Message, ToolCall, ToolDefinition};
