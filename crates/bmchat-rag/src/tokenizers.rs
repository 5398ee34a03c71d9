//! Token counters and sentence splitters used by the chunker

use std::sync::Arc;

use tiktoken_rs::CoreBPE;
use unicode_segmentation::UnicodeSegmentation;

use bmchat_core::{Error, Result, SentenceSplitter, TokenCounter};

/// Supported token counting strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerKind {
    /// OpenAI `cl100k_base` byte-pair encoding
    Tiktoken,
    /// Roughly one token per four bytes
    Heuristic,
}

impl TokenizerKind {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<TokenizerKind> {
        match s.trim().to_lowercase().as_str() {
            "tiktoken" | "cl100k" | "cl100k_base" => Some(TokenizerKind::Tiktoken),
            "heuristic" | "estimate" => Some(TokenizerKind::Heuristic),
            _ => None,
        }
    }

    /// Build the counter for this strategy
    pub fn build(self) -> Result<Arc<dyn TokenCounter>> {
        match self {
            TokenizerKind::Tiktoken => Ok(Arc::new(TiktokenCounter::cl100k()?)),
            TokenizerKind::Heuristic => Ok(Arc::new(HeuristicTokenCounter)),
        }
    }
}

impl std::fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenizerKind::Tiktoken => write!(f, "tiktoken"),
            TokenizerKind::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// Exact token counts for OpenAI models
#[derive(Clone)]
pub struct TiktokenCounter {
    bpe: Arc<CoreBPE>,
}

impl TiktokenCounter {
    /// Load the `cl100k_base` encoding used by the OpenAI embedding and chat models
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| Error::TokenCounter(format!("failed to load cl100k_base: {}", e)))?;
        Ok(Self { bpe: Arc::new(bpe) })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(self.bpe.encode_ordinary(text).len())
    }
}

/// Offline estimate: `ceil(bytes / 4)` per whitespace-separated word, summed.
///
/// Whitespace itself is free, so the count of two texts joined by a space is
/// the sum of their counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(text
            .split_whitespace()
            .map(|word| word.len().div_ceil(4))
            .sum())
    }
}

/// UAX #29 sentence segmentation
///
/// Boundaries that fall inside a run of non-whitespace characters (as in
/// `end.Next`) are not used, so a sentence never splits a word. The exception
/// is a boundary after an ideographic or fullwidth terminator such as `。`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSentenceSplitter;

impl SentenceSplitter for UnicodeSentenceSplitter {
    fn split_sentences(&self, text: &str) -> Result<Vec<String>> {
        let mut sentences = Vec::new();
        let mut current = String::new();

        for piece in text.split_sentence_bounds() {
            let glued = !current.is_empty()
                && !current.ends_with(char::is_whitespace)
                && !piece.starts_with(char::is_whitespace)
                && !ends_with_unspaced_terminator(&current);

            if !glued && !current.is_empty() {
                push_trimmed(&mut sentences, &current);
                current.clear();
            }
            current.push_str(piece);
        }
        push_trimmed(&mut sentences, &current);

        Ok(sentences)
    }
}

/// `。` and friends, optionally followed by closing quotes or brackets
fn ends_with_unspaced_terminator(text: &str) -> bool {
    text.trim_end_matches(is_closing_mark)
        .chars()
        .next_back()
        .is_some_and(|c| matches!(c, '。' | '｡' | '！' | '？' | '．' | '︒' | '﹒' | '﹖' | '﹗'))
}

fn is_closing_mark(c: char) -> bool {
    matches!(
        c,
        '」' | '』' | '）' | '】' | '〕' | '〉' | '》' | '”' | '’' | '"' | '\'' | ')' | ']'
    )
}

fn push_trimmed(sentences: &mut Vec<String>, sentence: &str) {
    let trimmed = sentence.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}
