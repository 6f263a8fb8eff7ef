//! Gemlink Core Library
//!
//! This crate translates OpenAI-style chat completion requests into Gemini
//! `generateContent` calls and wraps the reply in an OpenAI completion
//! envelope.

pub mod config;
pub mod error;
pub mod protocol;
pub mod providers;
pub mod translator;

pub use error::{BridgeError, BridgeResult};
pub use translator::{build_completion_response, translate_request, Translator};

/// Returns the version of the Gemlink Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
