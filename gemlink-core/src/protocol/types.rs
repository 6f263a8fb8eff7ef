//! OpenAI-compatible chat completion types
//!
//! These are the shapes accepted on the inbound `/v1/chat/completions`
//! endpoint and returned to the caller. The design prioritizes:
//! - Leniency on input (unknown roles, part arrays, extra fields)
//! - An exact, stable response envelope
//! - Zero-valued usage, since the upstream does not report token counts

use serde::{Deserialize, Serialize};

/// Object type reported on every completion response
pub const CHAT_COMPLETION_OBJECT: &str = "chat.completion";

/// Finish reason reported on every completion choice
pub const FINISH_REASON_STOP: &str = "stop";

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions
    System,
    /// User input message
    User,
    /// Assistant (model) response
    Assistant,
    /// Any role without a history mapping (`tool`, `function`, `developer`, ...)
    #[serde(other)]
    Other,
}

/// Content of a message: plain text or an array of typed parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content
    Text(String),
    /// Structured content parts (multimodal clients send these)
    Parts(Vec<ContentPart>),
}

/// One element of an array-form message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    /// Part type, e.g. `text` or `image_url`
    #[serde(rename = "type")]
    pub part_type: String,

    /// Text payload, present on `text` parts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl MessageContent {
    /// Flatten the content into a single string.
    ///
    /// Text parts are joined with a newline; non-text parts are skipped.
    pub fn to_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter(|part| part.part_type == "text")
                .filter_map(|part| part.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message; `null` is accepted and read as empty
    #[serde(default)]
    pub content: Option<MessageContent>,
}

impl ChatMessage {
    /// Create a message with plain text content
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(MessageContent::Text(content.into())),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Text of this message, empty when content is absent
    pub fn text(&self) -> String {
        self.content
            .as_ref()
            .map(MessageContent::to_text)
            .unwrap_or_default()
    }
}

/// Stop sequences: OpenAI allows a single string or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopSequences {
    One(String),
    Many(Vec<String>),
}

impl StopSequences {
    /// Normalize into a list
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StopSequences::One(stop) => vec![stop],
            StopSequences::Many(stops) => stops,
        }
    }
}

/// Chat completion request as received from the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Upstream model identifier, echoed back in the response
    pub model: String,

    /// Conversation; the last entry is the current turn
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopSequences>,

    /// Accepted for compatibility; responses are never streamed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatRequest {
    /// Create a request with no sampling overrides
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            top_p: None,
            max_tokens: None,
            stop: None,
            stream: None,
        }
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set top_p
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set stop sequences
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(StopSequences::Many(stop));
        self
    }
}

/// The assistant message inside a completion choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Always `assistant`
    pub role: MessageRole,
    pub content: String,
}

/// A single completion choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: String,
}

/// Token usage; always zero because the upstream reply carries no counts here
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Chat completion response returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Time-derived identifier, unique per call within a millisecond
    pub id: String,

    /// Always `chat.completion`
    pub object: String,

    /// Unix timestamp in seconds
    pub created: u64,

    /// Echo of the requested model
    pub model: String,

    /// Exactly one choice
    pub choices: Vec<CompletionChoice>,

    pub usage: CompletionUsage,
}

impl CompletionResponse {
    /// Content of the first choice
    pub fn content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// Body of an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// Error detail carried in the envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorEnvelope {
    /// Fallback used when an error renders to an empty string
    pub const UNKNOWN_ERROR: &'static str = "An unknown error occurred";

    /// Wrap a message, substituting the fallback for an empty one
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            Self::UNKNOWN_ERROR.to_string()
        } else {
            message
        };
        Self {
            error: ErrorBody { message },
        }
    }
}
