//! Upstream provider abstraction
//!
//! This module implements the seam between the translator and the
//! generative API, plus the Gemini REST implementation behind it.

pub mod adapter;
pub mod error;
pub mod gemini;

pub use adapter::{
    ChatSession, GenerationConfig, GenerativeBackend, HistoryEntry, HistoryRole, PromptFeedback,
    SafetySetting, TextPart, TurnReply,
};
pub use error::{ProviderError, ProviderResult};

// Re-export the concrete backend
pub use gemini::GeminiClient;
