//! Common types used across the bookmark chat system

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A saved page after text extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    pub title: String,
    pub text: String,
}

impl Document {
    pub fn new(url: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            text: text.into(),
        }
    }
}

/// A token-bounded span of a document's text
///
/// `sequence_index` is 0-based and increases in source order, so joining
/// the segments of one document by index with single spaces yields the
/// document's whitespace-separated words in their original order. Text
/// split between sentences that had no space in the source gains one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub sequence_index: usize,
    pub text: String,
    pub token_count: usize,
    pub source_url: String,
    pub source_title: String,
}

impl Segment {
    /// Corpus key of this segment
    pub fn key(&self) -> (&str, usize) {
        (&self.source_url, self.sequence_index)
    }
}

/// A segment paired with its embedding vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub segment: Segment,
    pub vector: Vec<f32>,
}

impl EmbeddingRecord {
    pub fn new(segment: Segment, vector: Vec<f32>) -> Self {
        Self { segment, vector }
    }

    /// Dimensionality of the stored vector
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }

    /// Human readable record label used in errors and logs
    pub fn label(&self) -> String {
        format!("{}#{}", self.segment.source_url, self.segment.sequence_index)
    }
}

/// A segment scored against a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub segment: Segment,
    /// Cosine similarity in [-1, 1], or negative infinity for degenerate vectors
    pub score: f32,
}

/// Configuration for retry behavior at the provider boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryConfig {
    /// Exponential backoff for the given 1-based retry attempt, capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_backoff
            .saturating_mul(1 << shift)
            .min(self.max_backoff)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(16),
        }
    }
}
