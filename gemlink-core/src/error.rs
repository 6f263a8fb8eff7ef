//! Top-level error type for a chat completion round trip

use crate::config::ErrorStatusPolicy;
use crate::protocol::ErrorEnvelope;
use crate::providers::ProviderError;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type for translator operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Everything that can go wrong while serving one completion
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The inbound request cannot be translated
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The upstream answered but produced no usable text
    #[error("{message}")]
    EmptyResponse {
        message: String,
        block_reason: Option<String>,
    },

    /// The upstream call itself failed
    #[error(transparent)]
    Upstream(#[from] ProviderError),

    /// Anything else
    #[error("{0}")]
    Internal(String),
}

impl BridgeError {
    /// HTTP status for this error under the given policy
    pub fn status_code(&self, policy: ErrorStatusPolicy) -> StatusCode {
        if policy == ErrorStatusPolicy::Uniform {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }

        match self {
            BridgeError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            BridgeError::Upstream(ProviderError::Authentication(_)) => StatusCode::UNAUTHORIZED,
            BridgeError::Upstream(ProviderError::RateLimit(_)) => StatusCode::TOO_MANY_REQUESTS,
            BridgeError::Upstream(ProviderError::Configuration(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            BridgeError::Upstream(_) | BridgeError::EmptyResponse { .. } => StatusCode::BAD_GATEWAY,
            BridgeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The error body sent to the caller
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(self.to_string())
    }
}
