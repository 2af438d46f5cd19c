//! Generative text integration
//!
//! Provides:
//! - An OpenAI-compatible chat completion client
//! - A primary/fallback adapter for structured extraction and narrative synthesis
//! - Helpers for locating JSON inside model output

mod adapter;
mod client;
mod parse;

pub use adapter::{GenerationAdapter, GenerationUnavailable};
pub use client::{ChatMessage, HttpChatClient, LLMClient};
pub use parse::extract_json_object;
