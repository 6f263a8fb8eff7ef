//! Protocol module for the OpenAI-compatible request/response structures
//!
//! This module defines the data models exchanged with callers of the
//! chat completions endpoint. These structures are designed to be:
//! - Lenient on input so real-world clients are accepted
//! - Exact on output so clients parse responses without surprises

pub mod types;

pub use types::{
    AssistantMessage, ChatMessage, ChatRequest, CompletionChoice, CompletionResponse,
    CompletionUsage, ContentPart, ErrorBody, ErrorEnvelope, MessageContent, MessageRole,
    StopSequences, CHAT_COMPLETION_OBJECT, FINISH_REASON_STOP,
};
