//! Gemini provider implementation
//!
//! This module provides the REST backend for the Gemini API, translating
//! chat sessions into `generateContent` calls and replies back into turns.

mod client;
pub mod converter;
pub mod types;

pub use client::GeminiClient;
pub use types::{GenerateContentRequest, GenerateContentResponse};
