//! HTTP adapter exposing `/v1/chat/completions` over the Gemini API.
#![deny(unsafe_code)]

pub mod cors;
pub mod server;

pub use server::{CHAT_COMPLETIONS_PATH, router, serve};
