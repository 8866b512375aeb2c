//! LLM provider abstraction and the Ollama backend.

pub mod any;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod provider;

pub use any::AnyProvider;
pub use error::LlmError;
pub use provider::{EmbedFn, EmbedFuture, LlmProvider, Message, Role};
