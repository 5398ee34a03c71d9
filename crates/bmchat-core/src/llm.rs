//! Completion provider trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Result;

/// Configuration for chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_id: "gpt-4-turbo-preview".to_string(),
            max_tokens: 1000,
            temperature: Some(0.7),
            timeout: Duration::from_secs(60),
        }
    }
}

/// A two-message prompt: system instructions plus the user turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

impl ChatPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Trait for completion providers (OpenAI or any compatible endpoint)
///
/// Implementations own their retry policy; callers only see the final
/// success or a typed failure.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete a prompt and return the assistant message text
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String>;

    /// Get the model ID being used
    fn model_id(&self) -> &str;
}
