//! Gemini API types
//!
//! These types match the `generateContent` REST format and are used for
//! serialization/deserialization when communicating with the Gemini servers.

use crate::providers::adapter::{GenerationConfig, HistoryEntry, PromptFeedback, SafetySetting};
use serde::{Deserialize, Serialize};

/// Gemini `generateContent` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Prior history followed by the current user turn
    pub contents: Vec<HistoryEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<Vec<SafetySetting>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Gemini `generateContent` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// A response candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<CandidateContent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Content of a candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A candidate part; only text parts are read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidatePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Gemini error response
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiError {
    pub error: GeminiErrorDetail,
}

/// Gemini error detail
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiErrorDetail {
    #[serde(default)]
    pub code: Option<u16>,

    pub message: String,

    /// Canonical status, e.g. `INVALID_ARGUMENT`
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub details: Vec<serde_json::Value>,
}

impl GeminiErrorDetail {
    /// Whether any `ErrorInfo` detail carries the given reason
    pub fn has_reason(&self, reason: &str) -> bool {
        self.details
            .iter()
            .filter_map(|d| d.get("reason").and_then(|r| r.as_str()))
            .any(|r| r == reason)
    }
}
