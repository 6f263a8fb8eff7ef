//! Gemini client implementation

use super::converter::{from_gemini_response, model_resource, to_gemini_request};
use super::types::{GeminiError, GenerateContentResponse};
use crate::config::{SecretString, UpstreamConfig};
use crate::providers::adapter::{ChatSession, GenerativeBackend, TurnReply};
use crate::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Default user agent
const USER_AGENT: &str = concat!("gemlink/", env!("CARGO_PKG_VERSION"));

/// Gemini REST client
pub struct GeminiClient {
    config: UpstreamConfig,
    client: Client,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: UpstreamConfig) -> ProviderResult<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT).gzip(true);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder.build().map_err(|e| {
            ProviderError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { config, client })
    }

    /// Full `generateContent` URL for a model
    pub fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/{}/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version,
            model_resource(model)
        )
    }

    /// Build request headers
    fn build_headers(&self, credential: Option<&SecretString>) -> ProviderResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        if let Some(key) = credential {
            let mut value = HeaderValue::from_str(key.expose_secret()).map_err(|_| {
                ProviderError::Authentication(
                    "API key contains characters not allowed in a header".to_string(),
                )
            })?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        Ok(headers)
    }

    /// Handle API errors
    fn handle_error_response(&self, status: StatusCode, body: String) -> ProviderError {
        // Try to parse the Gemini error envelope
        if let Ok(error) = serde_json::from_str::<GeminiError>(&body) {
            let detail = error.error;
            if detail.has_reason("API_KEY_INVALID") {
                return ProviderError::Authentication(detail.message);
            }
            match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ProviderError::Authentication(detail.message)
                }
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimit(detail.message),
                StatusCode::NOT_FOUND => ProviderError::ModelNotFound(detail.message),
                StatusCode::BAD_REQUEST => ProviderError::InvalidRequest(detail.message),
                s if s.is_server_error() => ProviderError::ServiceUnavailable(detail.message),
                _ => ProviderError::ProviderError {
                    code: detail
                        .status
                        .unwrap_or_else(|| status.as_u16().to_string()),
                    message: detail.message,
                },
            }
        } else {
            // Fallback to status code-based error
            match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ProviderError::Authentication(body)
                }
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimit(body),
                StatusCode::BAD_REQUEST => ProviderError::InvalidRequest(body),
                StatusCode::NOT_FOUND => ProviderError::ModelNotFound(body),
                s if s.is_server_error() => ProviderError::ServiceUnavailable(body),
                _ => ProviderError::ProviderError {
                    code: status.to_string(),
                    message: body,
                },
            }
        }
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn send_turn(
        &self,
        credential: Option<&SecretString>,
        session: &ChatSession,
        prompt: &str,
    ) -> ProviderResult<TurnReply> {
        if credential.is_none() {
            warn!("No API key available; forwarding request without one");
        }

        let url = self.generate_url(&session.model);
        let body = to_gemini_request(session, prompt);
        debug!(url = %url, contents = body.contents.len(), "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .headers(self.build_headers(credential)?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            let parsed: GenerateContentResponse = serde_json::from_str(&text)?;
            Ok(from_gemini_response(parsed))
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(self.handle_error_response(status, body))
        }
    }
}
