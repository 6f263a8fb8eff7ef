//! Axum HTTP server for the OpenAI-compatible endpoint.
//!
//! This module provides [`router`] for in-process use and [`serve`] which
//! runs it on a pre-bound `TcpListener` until the shutdown future resolves.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use gemlink_core::protocol::ChatRequest;
use gemlink_core::{BridgeError, Translator};
use tokio::net::TcpListener;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use crate::cors::{apply_cors_headers, preflight};

/// Path of the completions endpoint.
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Shared application state.
#[derive(Clone)]
struct AppState {
    translator: Arc<Translator>,
}

/// Build the application router.
pub fn router(translator: Arc<Translator>) -> Router {
    let state = AppState { translator };

    Router::new()
        .route("/health", get(health_check))
        .route(
            CHAT_COMPLETIONS_PATH,
            post(chat_completions).options(preflight),
        )
        .layer(middleware::map_response(apply_cors_headers))
        .with_state(state)
}

/// Run the server with a pre-bound listener.
///
/// Returns `Ok(())` on clean shutdown, or an error if the server fails.
pub async fn serve<F>(
    listener: TcpListener,
    translator: Arc<Translator>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("Listening on http://{addr}{CHAT_COMPLETIONS_PATH}");

    axum::serve(listener, router(translator))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shut down");
    Ok(())
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

/// Handle chat completions: parse, translate, answer.
async fn chat_completions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("chat_completion", %request_id);

    async move {
        debug!("POST {CHAT_COMPLETIONS_PATH}");

        let request: ChatRequest = match serde_json::from_slice(&body) {
            Ok(req) => req,
            Err(e) => {
                let err = BridgeError::InvalidRequest(format!("could not parse body: {e}"));
                return error_response(&err, &state);
            }
        };

        match state.translator.complete(&headers, request).await {
            Ok(response) => (StatusCode::OK, Json(response)).into_response(),
            Err(err) => error_response(&err, &state),
        }
    }
    .instrument(span)
    .await
}

/// Convert a failure into an error envelope response.
fn error_response(err: &BridgeError, state: &AppState) -> Response {
    let status = err.status_code(state.translator.error_status());
    error!(status = status.as_u16(), "Chat completion failed: {err}");
    (status, Json(err.to_envelope())).into_response()
}
