//! Fixed CORS policy for the completions endpoint.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET,HEAD,POST,OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Append the CORS header set to any response.
pub async fn apply_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    response
}

/// Preflight: 204 with no body. Headers come from [`apply_cors_headers`].
pub async fn preflight() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
