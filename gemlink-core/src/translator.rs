//! OpenAI <-> Gemini translation
//!
//! The [`Translator`] owns one upstream backend plus the settings injected at
//! construction time (default credential, safety settings, status policy).
//! Each call to [`Translator::complete`] is one sequential round trip:
//! credential, history, upstream turn, completion envelope.

use crate::config::{ErrorStatusPolicy, GemlinkConfig, SecretString};
use crate::error::{BridgeError, BridgeResult};
use crate::protocol::{
    AssistantMessage, ChatRequest, CompletionChoice, CompletionResponse, CompletionUsage,
    MessageRole, CHAT_COMPLETION_OBJECT, FINISH_REASON_STOP,
};
use crate::providers::{
    ChatSession, GeminiClient, GenerationConfig, GenerativeBackend, HistoryEntry, ProviderResult,
    SafetySetting, TurnReply,
};
use reqwest::header::{HeaderMap, AUTHORIZATION};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Prefix of every completion id
pub const COMPLETION_ID_PREFIX: &str = "gemini-";

/// Translate prior turns into upstream history and pick the current prompt.
///
/// Every message but the last becomes history: `user` stays `user`,
/// `assistant` becomes `model`, anything else is dropped. The prompt is the
/// last message's content whatever its role.
pub fn translate_request(request: &ChatRequest) -> BridgeResult<(Vec<HistoryEntry>, String)> {
    let (current, prior) = request.messages.split_last().ok_or_else(|| {
        BridgeError::InvalidRequest("messages must contain at least one entry".to_string())
    })?;

    let history = prior
        .iter()
        .filter_map(|message| match message.role {
            MessageRole::User => Some(HistoryEntry::user(message.text())),
            MessageRole::Assistant => Some(HistoryEntry::model(message.text())),
            MessageRole::System | MessageRole::Other => None,
        })
        .collect();

    Ok((history, current.text()))
}

/// Sampling parameters carried over from the request
pub fn generation_config(request: &ChatRequest) -> GenerationConfig {
    GenerationConfig {
        temperature: request.temperature,
        top_p: request.top_p,
        max_output_tokens: request.max_tokens,
        stop_sequences: request.stop.clone().map(|s| s.into_vec()),
    }
}

/// Wrap an upstream reply in the completion envelope.
///
/// Fails when the reply has no text or the upstream blocked the prompt.
pub fn build_completion_response(model: &str, reply: &TurnReply) -> BridgeResult<CompletionResponse> {
    if let Some(reason) = reply.block_reason() {
        return Err(BridgeError::EmptyResponse {
            message: format!("Gemini API blocked the prompt. Reason: {}", reason),
            block_reason: Some(reason.to_string()),
        });
    }

    if reply.text.is_empty() {
        let message = match reply.finish_reason.as_deref() {
            Some(reason) if reason != "STOP" => format!(
                "Gemini API returned an empty response. Finish reason: {}",
                reason
            ),
            _ => "Gemini API returned an empty response.".to_string(),
        };
        return Err(BridgeError::EmptyResponse {
            message,
            block_reason: None,
        });
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    Ok(CompletionResponse {
        id: format!("{}{}", COMPLETION_ID_PREFIX, now.as_millis()),
        object: CHAT_COMPLETION_OBJECT.to_string(),
        created: now.as_secs(),
        model: model.to_string(),
        choices: vec![CompletionChoice {
            index: 0,
            message: AssistantMessage {
                role: MessageRole::Assistant,
                content: reply.text.clone(),
            },
            finish_reason: FINISH_REASON_STOP.to_string(),
        }],
        usage: CompletionUsage::default(),
    })
}

/// Token from an `Authorization: Bearer <token>` value
fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Translates chat completion requests into upstream turns
pub struct Translator {
    backend: Arc<dyn GenerativeBackend>,
    default_credential: Option<SecretString>,
    safety_settings: Option<Vec<SafetySetting>>,
    error_status: ErrorStatusPolicy,
}

impl Translator {
    /// Create a translator with provider-default safety and no fallback key
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            default_credential: None,
            safety_settings: None,
            error_status: ErrorStatusPolicy::default(),
        }
    }

    /// Build a translator backed by the Gemini REST API
    pub fn from_config(config: &GemlinkConfig) -> ProviderResult<Self> {
        let backend = GeminiClient::new(config.upstream.clone())?;
        Ok(Self::new(Arc::new(backend))
            .with_default_credential(config.default_api_key.clone())
            .with_safety_settings(config.safety.settings())
            .with_error_status(config.error_status))
    }

    /// Set the credential used when a request has no bearer token
    pub fn with_default_credential(mut self, credential: Option<SecretString>) -> Self {
        self.default_credential = credential;
        self
    }

    /// Set the safety settings sent with every session
    pub fn with_safety_settings(mut self, settings: Option<Vec<SafetySetting>>) -> Self {
        self.safety_settings = settings;
        self
    }

    /// Set the status policy
    pub fn with_error_status(mut self, policy: ErrorStatusPolicy) -> Self {
        self.error_status = policy;
        self
    }

    /// Status policy in effect
    pub fn error_status(&self) -> ErrorStatusPolicy {
        self.error_status
    }

    /// Pick the credential for a request.
    ///
    /// A bearer token wins; otherwise the configured default. `None` is not
    /// an error here: the upstream rejects the call and that failure is
    /// reported instead.
    pub fn extract_credential(&self, headers: &HeaderMap) -> Option<SecretString> {
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_bearer);

        match bearer {
            Some(token) => {
                debug!(source = "header", "Using request credential");
                Some(SecretString::new(token))
            }
            None => {
                debug!(
                    source = "default",
                    configured = self.default_credential.is_some(),
                    "Falling back to default credential"
                );
                self.default_credential.clone()
            }
        }
    }

    /// Serve one chat completion
    pub async fn complete(
        &self,
        headers: &HeaderMap,
        request: ChatRequest,
    ) -> BridgeResult<CompletionResponse> {
        let credential = self.extract_credential(headers);
        let (history, prompt) = translate_request(&request)?;

        if request.stream == Some(true) {
            warn!("Streaming was requested; replying with a single completion");
        }

        info!(
            model = %request.model,
            backend = self.backend.name(),
            history = history.len(),
            "Processing chat completion request"
        );

        let session = ChatSession::new(request.model.clone(), history)
            .with_safety_settings(self.safety_settings.clone())
            .with_generation_config(generation_config(&request));

        let reply = self
            .backend
            .send_turn(credential.as_ref(), &session, &prompt)
            .await?;

        let response = build_completion_response(&request.model, &reply)?;
        debug!(id = %response.id, chars = reply.text.len(), "Completion ready");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ChatMessage, ContentPart, MessageContent, StopSequences};
    use crate::providers::{HistoryRole, PromptFeedback};
    use proptest::prelude::*;
    use reqwest::header::HeaderValue;
    use test_case::test_case;

    fn request(messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest::new("gemini-pro", messages)
    }

    #[test]
    fn test_round_trip_scenario() {
        let (history, prompt) = translate_request(&request(vec![
            ChatMessage::user("Hi"),
            ChatMessage::assistant("Hello!"),
            ChatMessage::user("How are you?"),
        ]))
        .unwrap();

        assert_eq!(
            history,
            vec![HistoryEntry::user("Hi"), HistoryEntry::model("Hello!")]
        );
        assert_eq!(prompt, "How are you?");
    }

    #[test_case(MessageRole::User, Some(HistoryRole::User) ; "user stays user")]
    #[test_case(MessageRole::Assistant, Some(HistoryRole::Model) ; "assistant becomes model")]
    #[test_case(MessageRole::System, None ; "system dropped")]
    #[test_case(MessageRole::Other, None ; "unknown dropped")]
    fn test_role_mapping(role: MessageRole, expected: Option<HistoryRole>) {
        let (history, _) = translate_request(&request(vec![
            ChatMessage::new(role, "prior"),
            ChatMessage::user("now"),
        ]))
        .unwrap();

        assert_eq!(history.first().map(|e| e.role), expected);
    }

    #[test]
    fn test_prompt_taken_from_last_message_regardless_of_role() {
        let (history, prompt) = translate_request(&request(vec![
            ChatMessage::user("question"),
            ChatMessage::system("be terse"),
        ]))
        .unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(prompt, "be terse");
    }

    #[test]
    fn test_single_message_has_empty_history() {
        let (history, prompt) = translate_request(&request(vec![ChatMessage::user("solo")])).unwrap();
        assert!(history.is_empty());
        assert_eq!(prompt, "solo");
    }

    #[test]
    fn test_empty_messages_rejected() {
        let err = translate_request(&request(vec![])).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidRequest(_)));
    }

    #[test]
    fn test_part_array_content_is_flattened() {
        let message = ChatMessage {
            role: MessageRole::User,
            content: Some(MessageContent::Parts(vec![
                ContentPart {
                    part_type: "text".to_string(),
                    text: Some("look".to_string()),
                },
                ContentPart {
                    part_type: "image_url".to_string(),
                    text: None,
                },
                ContentPart {
                    part_type: "text".to_string(),
                    text: Some("here".to_string()),
                },
            ])),
        };

        let (_, prompt) = translate_request(&request(vec![message])).unwrap();
        assert_eq!(prompt, "look\nhere");
    }

    #[test]
    fn test_generation_config_from_request() {
        let mut req = request(vec![ChatMessage::user("x")])
            .with_temperature(0.2)
            .with_max_tokens(50);
        req.stop = Some(StopSequences::One("END".to_string()));

        let config = generation_config(&req);
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.max_output_tokens, Some(50));
        assert_eq!(config.stop_sequences, Some(vec!["END".to_string()]));
        assert!(generation_config(&request(vec![])).is_empty());
    }

    #[test]
    fn test_build_completion_response() {
        let response = build_completion_response("gemini-pro", &TurnReply::text("Fine, thanks")).unwrap();

        assert!(response.id.starts_with(COMPLETION_ID_PREFIX));
        assert!(response.id[COMPLETION_ID_PREFIX.len()..].parse::<u128>().is_ok());
        assert_eq!(response.object, "chat.completion");
        assert_eq!(response.model, "gemini-pro");
        assert_eq!(response.choices.len(), 1);
        assert_eq!(response.choices[0].index, 0);
        assert_eq!(response.choices[0].message.role, MessageRole::Assistant);
        assert_eq!(response.choices[0].finish_reason, "stop");
        assert_eq!(response.content(), Some("Fine, thanks"));
        assert_eq!(response.usage, CompletionUsage::default());
        assert!(response.created > 1_600_000_000);
    }

    #[test]
    fn test_block_reason_surfaces_in_error() {
        let reply = TurnReply {
            text: String::new(),
            prompt_feedback: Some(PromptFeedback {
                block_reason: Some("SAFETY".to_string()),
            }),
            finish_reason: None,
        };

        let err = build_completion_response("gemini-pro", &reply).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
        assert!(matches!(
            err,
            BridgeError::EmptyResponse { block_reason: Some(ref r), .. } if r == "SAFETY"
        ));
    }

    #[test]
    fn test_empty_reply_without_reason() {
        let err = build_completion_response("gemini-pro", &TurnReply::default()).unwrap_err();
        assert_eq!(err.to_string(), "Gemini API returned an empty response.");
    }

    #[test]
    fn test_empty_reply_mentions_unusual_finish_reason() {
        let reply = TurnReply {
            finish_reason: Some("RECITATION".to_string()),
            ..Default::default()
        };
        let err = build_completion_response("gemini-pro", &reply).unwrap_err();
        assert!(err.to_string().ends_with("Finish reason: RECITATION"));
    }

    #[test_case("Bearer abc123", Some("abc123") ; "bearer token")]
    #[test_case("bearer abc123", Some("abc123") ; "lowercase scheme")]
    #[test_case("Bearer   ", None ; "empty token")]
    #[test_case("Basic dXNlcjpwYXNz", None ; "other scheme")]
    #[test_case("abc123", None ; "bare value")]
    fn test_parse_bearer(value: &str, expected: Option<&str>) {
        assert_eq!(parse_bearer(value), expected);
    }

    struct NoopBackend;

    #[async_trait::async_trait]
    impl GenerativeBackend for NoopBackend {
        fn name(&self) -> &str {
            "noop"
        }

        async fn send_turn(
            &self,
            _credential: Option<&SecretString>,
            _session: &ChatSession,
            _prompt: &str,
        ) -> ProviderResult<TurnReply> {
            Ok(TurnReply::text("ok"))
        }
    }

    fn translator(default: Option<&str>) -> Translator {
        Translator::new(Arc::new(NoopBackend)).with_default_credential(default.map(SecretString::new))
    }

    #[test]
    fn test_extract_credential_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));

        let credential = translator(Some("fallback")).extract_credential(&headers);
        assert_eq!(credential.unwrap().expose_secret(), "abc123");
    }

    #[test]
    fn test_extract_credential_falls_back() {
        let credential = translator(Some("fallback")).extract_credential(&HeaderMap::new());
        assert_eq!(credential.unwrap().expose_secret(), "fallback");
    }

    #[test]
    fn test_extract_credential_none_when_nothing_configured() {
        assert!(translator(None).extract_credential(&HeaderMap::new()).is_none());
    }

    fn arb_role() -> impl Strategy<Value = MessageRole> {
        prop_oneof![
            Just(MessageRole::User),
            Just(MessageRole::Assistant),
            Just(MessageRole::System),
            Just(MessageRole::Other),
        ]
    }

    proptest! {
        #[test]
        fn prop_history_length_and_prompt(
            messages in prop::collection::vec((arb_role(), ".{0,12}"), 1..20)
        ) {
            let chat: Vec<ChatMessage> = messages
                .iter()
                .map(|(role, text)| ChatMessage::new(*role, text.clone()))
                .collect();
            let (history, prompt) = translate_request(&request(chat.clone())).unwrap();

            let prior = &chat[..chat.len() - 1];
            let dropped = prior
                .iter()
                .filter(|m| !matches!(m.role, MessageRole::User | MessageRole::Assistant))
                .count();

            prop_assert_eq!(history.len(), chat.len() - 1 - dropped);
            prop_assert_eq!(prompt, chat[chat.len() - 1].text());

            let kept: Vec<String> = prior
                .iter()
                .filter(|m| matches!(m.role, MessageRole::User | MessageRole::Assistant))
                .map(|m| m.text())
                .collect();
            let texts: Vec<String> = history.iter().map(|e| e.parts[0].text.clone()).collect();
            prop_assert_eq!(texts, kept);
        }
    }
}
