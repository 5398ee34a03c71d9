//! Token-budgeted text chunker
//!
//! Packs whole sentences into segments of at most `target_tokens` tokens.
//! A sentence that is over budget on its own is split at word boundaries,
//! with every word measured independently. A single word that is over budget
//! becomes a segment of its own.

use tracing::debug;

use bmchat_core::{Document, Error, Result, Segment, SentenceSplitter, TokenCounter};

/// Default token budget per segment
pub const DEFAULT_TARGET_TOKENS: usize = 500;

/// Greedy sentence-packing chunker
pub struct Chunker<C, S> {
    counter: C,
    splitter: S,
    target_tokens: usize,
}

impl<C: TokenCounter, S: SentenceSplitter> Chunker<C, S> {
    /// Create a chunker from a token counter, a sentence splitter and a token budget
    pub fn new(counter: C, splitter: S, target_tokens: usize) -> Result<Self> {
        if target_tokens == 0 {
            return Err(Error::InvalidInput(
                "target_tokens must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            counter,
            splitter,
            target_tokens,
        })
    }

    /// The configured token budget
    pub fn target_tokens(&self) -> usize {
        self.target_tokens
    }

    /// Count tokens with the injected counter
    pub fn count_tokens(&self, text: &str) -> Result<usize> {
        self.counter.count_tokens(text)
    }

    /// Split text into segment texts, in source order
    pub fn split_into_chunks(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let sentences = self.splitter.split_sentences(text)?;
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0;

        for sentence in sentences.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            let sentence_tokens = self.counter.count_tokens(sentence)?;

            if sentence_tokens > self.target_tokens {
                flush(&mut chunks, &mut current);
                current_tokens = 0;
                self.split_oversized_sentence(sentence, &mut chunks)?;
                continue;
            }

            if current_tokens + sentence_tokens > self.target_tokens {
                flush(&mut chunks, &mut current);
                current_tokens = 0;
            }

            current.push(sentence);
            current_tokens += sentence_tokens;
        }

        flush(&mut chunks, &mut current);

        debug!(
            chunks = chunks.len(),
            target_tokens = self.target_tokens,
            "split text into chunks"
        );
        Ok(chunks)
    }

    /// Chunk a document into numbered segments with their own token counts
    pub fn chunk_document(&self, document: &Document) -> Result<Vec<Segment>> {
        self.split_into_chunks(&document.text)?
            .into_iter()
            .enumerate()
            .map(|(index, text)| {
                Ok(Segment {
                    sequence_index: index,
                    token_count: self.counter.count_tokens(&text)?,
                    text,
                    source_url: document.url.clone(),
                    source_title: document.title.clone(),
                })
            })
            .collect()
    }

    /// Word-level packing for a sentence that does not fit the budget.
    ///
    /// Each word is measured on its own rather than reusing the sentence
    /// total.
    fn split_oversized_sentence(&self, sentence: &str, chunks: &mut Vec<String>) -> Result<()> {
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0;

        for word in sentence.split_whitespace() {
            let word_tokens = self.counter.count_tokens(word)?;

            if current_tokens + word_tokens > self.target_tokens {
                flush(chunks, &mut current);
                current_tokens = 0;
            }

            current.push(word);
            current_tokens += word_tokens;
        }

        flush(chunks, &mut current);
        Ok(())
    }
}

fn flush(chunks: &mut Vec<String>, pending: &mut Vec<&str>) {
    if !pending.is_empty() {
        chunks.push(pending.join(" "));
        pending.clear();
    }
}
