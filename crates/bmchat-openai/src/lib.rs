//! OpenAI integration for bmchat
//!
//! This crate provides one client implementing both the `EmbeddingProvider`
//! and `CompletionProvider` traits against the OpenAI HTTP API or any
//! compatible endpoint.

mod client;
mod config;


pub use client::OpenAiClient;
pub use config::{DEFAULT_BASE_URL, DEFAULT_EMBEDDING_MODEL, OpenAiConfig};

// Re-export core types for convenience
pub use bmchat_core::{
    ChatPrompt, CompletionProvider, EmbeddingProvider, Error, GenerationConfig, Result,
    RetryConfig,
};
