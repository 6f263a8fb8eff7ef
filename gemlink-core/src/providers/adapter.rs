//! Upstream capability trait and session types
//!
//! Defines the seam between the translator and the generative API. A chat
//! session is expressed as a plain value (model, prior history, optional
//! safety and generation settings) and a single turn is sent against it.

use super::error::ProviderResult;
use crate::config::SecretString;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a prior turn in the upstream history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Model,
}

/// A text part of a history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPart {
    pub text: String,
}

/// One prior conversational turn in the upstream representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub parts: Vec<TextPart>,
}

impl HistoryEntry {
    /// Create a single-part entry
    pub fn new(role: HistoryRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![TextPart { text: text.into() }],
        }
    }

    /// A user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(HistoryRole::User, text)
    }

    /// A model turn
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(HistoryRole::Model, text)
    }
}

/// A content-safety rule sent with the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    /// Harm category, e.g. `HARM_CATEGORY_HARASSMENT`
    pub category: String,
    /// Blocking threshold, e.g. `BLOCK_NONE`
    pub threshold: String,
}

impl SafetySetting {
    pub fn new(category: impl Into<String>, threshold: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            threshold: threshold.into(),
        }
    }
}

/// Sampling parameters forwarded to the upstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl GenerationConfig {
    /// True when no parameter is set
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.top_p.is_none()
            && self.max_output_tokens.is_none()
            && self.stop_sequences.is_none()
    }
}

/// A transient chat session: everything the upstream needs besides the prompt
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    pub model: String,
    pub history: Vec<HistoryEntry>,
    /// `None` leaves the provider's default safety behavior in place
    pub safety_settings: Option<Vec<SafetySetting>>,
    pub generation_config: Option<GenerationConfig>,
}

impl ChatSession {
    /// Create a session with provider defaults
    pub fn new(model: impl Into<String>, history: Vec<HistoryEntry>) -> Self {
        Self {
            model: model.into(),
            history,
            safety_settings: None,
            generation_config: None,
        }
    }

    /// Attach explicit safety settings
    pub fn with_safety_settings(mut self, settings: Option<Vec<SafetySetting>>) -> Self {
        self.safety_settings = settings;
        self
    }

    /// Attach sampling parameters, dropping an empty config
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = if config.is_empty() { None } else { Some(config) };
        self
    }
}

/// Feedback the upstream attaches to the prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

/// The upstream reply to one turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReply {
    /// Concatenated reply text; empty when nothing usable came back
    pub text: String,
    pub prompt_feedback: Option<PromptFeedback>,
    /// Finish reason of the first candidate, if any
    pub finish_reason: Option<String>,
}

impl TurnReply {
    /// A reply carrying only text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Block reason surfaced by the upstream, if any
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

/// The upstream generative capability
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Send `prompt` as the next user turn of `session`.
    ///
    /// A missing credential is forwarded as-is; rejecting it is the
    /// upstream's job.
    async fn send_turn(
        &self,
        credential: Option<&SecretString>,
        session: &ChatSession,
        prompt: &str,
    ) -> ProviderResult<TurnReply>;
}
