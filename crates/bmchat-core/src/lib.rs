//! Core traits and types for bmchat
//!
//! This crate defines the data model (documents, segments, embedding records)
//! and the capability-facing interfaces the rest of the system is written
//! against: token counting, sentence segmentation, embedding and completion.
//! Concrete capabilities are injected, which keeps the chunker and the
//! retrieval engine pure and test-friendly.

pub mod embedder;
pub mod error;
pub mod llm;
pub mod tokenizer;
pub mod types;


pub use embedder::EmbeddingProvider;
pub use error::{Error, Result};
pub use llm::{ChatPrompt, CompletionProvider, GenerationConfig};
pub use tokenizer::{SentenceSplitter, TokenCounter};
pub use types::*;
