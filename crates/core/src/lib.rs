//! Vidprompt Core Library
//!
//! Validates prompt requests against stored video transcripts and relays
//! streaming chat completions from hosted LLM providers.

pub mod completion;
pub mod cors;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod relay;
pub mod request;
pub mod store;
pub mod types;

// Re-export commonly used items at crate root
pub use completion::{ChunkStream, CompletionClient, OpenAiCompatClient};
pub use error::{Error, Result};
pub use prompt::{TRANSCRIPTION_PLACEHOLDER, compose_prompt};
pub use provider::{Provider, ProviderConfig};
pub use relay::{Relay, RelayConfig, RelayState};
pub use store::{DiskVideoStore, MemoryVideoStore, VideoStore};
pub use types::{
    ChatMessage, ChatRequest, ChatRole, CompletionRequest, Transcript, VideoLookup, VideoRecord,
};
