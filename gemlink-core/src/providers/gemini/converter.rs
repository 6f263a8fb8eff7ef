//! Conversion between chat sessions and the Gemini wire format

use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::providers::adapter::{ChatSession, HistoryEntry, TurnReply};

/// Build the `generateContent` body for one turn of `session`
pub fn to_gemini_request(session: &ChatSession, prompt: &str) -> GenerateContentRequest {
    let mut contents = Vec::with_capacity(session.history.len() + 1);
    contents.extend(session.history.iter().cloned());
    contents.push(HistoryEntry::user(prompt));

    GenerateContentRequest {
        contents,
        safety_settings: session.safety_settings.clone(),
        generation_config: session.generation_config.clone(),
    }
}

/// Read a turn reply out of a `generateContent` response.
///
/// Only the first candidate counts; its text parts are concatenated.
pub fn from_gemini_response(response: GenerateContentResponse) -> TurnReply {
    let first = response.candidates.into_iter().next();

    let (text, finish_reason) = match first {
        Some(candidate) => {
            let text = candidate
                .content
                .map(|content| {
                    content
                        .parts
                        .into_iter()
                        .filter_map(|part| part.text)
                        .collect::<String>()
                })
                .unwrap_or_default();
            (text, candidate.finish_reason)
        }
        None => (String::new(), None),
    };

    TurnReply {
        text,
        prompt_feedback: response.prompt_feedback,
        finish_reason,
    }
}

/// Resource path for a model name.
///
/// Bare names get a `models/` prefix; names that already carry a
/// collection (`models/x`, `tunedModels/y`) are used verbatim.
pub fn model_resource(model: &str) -> String {
    if model.contains('/') {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}
