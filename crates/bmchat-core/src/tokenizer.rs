//! Token counting and sentence segmentation capabilities
//!
//! Both are injected into the chunker so the tokenizer used at chunk time
//! can be swapped without touching the packing algorithm.

use crate::Result;

/// Counts tokens the way the downstream model will see them
pub trait TokenCounter: Send + Sync {
    /// Count the tokens in `text`.
    ///
    /// Failures (for example an encoding error) must be reported as
    /// [`crate::Error::TokenCounter`].
    fn count_tokens(&self, text: &str) -> Result<usize>;
}

/// Splits text into an ordered sequence of sentences
pub trait SentenceSplitter: Send + Sync {
    /// Split `text` into sentences, preserving source order.
    fn split_sentences(&self, text: &str) -> Result<Vec<String>>;
}

impl<T: TokenCounter + ?Sized> TokenCounter for &T {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        (**self).count_tokens(text)
    }
}

impl<T: TokenCounter + ?Sized> TokenCounter for std::sync::Arc<T> {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        (**self).count_tokens(text)
    }
}

impl<T: TokenCounter + ?Sized> TokenCounter for Box<T> {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        (**self).count_tokens(text)
    }
}

impl<T: SentenceSplitter + ?Sized> SentenceSplitter for &T {
    fn split_sentences(&self, text: &str) -> Result<Vec<String>> {
        (**self).split_sentences(text)
    }
}

impl<T: SentenceSplitter + ?Sized> SentenceSplitter for std::sync::Arc<T> {
    fn split_sentences(&self, text: &str) -> Result<Vec<String>> {
        (**self).split_sentences(text)
    }
}

impl<T: SentenceSplitter + ?Sized> SentenceSplitter for Box<T> {
    fn split_sentences(&self, text: &str) -> Result<Vec<String>> {
        (**self).split_sentences(text)
    }
}
