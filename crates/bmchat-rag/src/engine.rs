//! Question answering over the embedded bookmark corpus

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use bmchat_core::{ChatPrompt, CompletionProvider, EmbeddingProvider, RankedResult, Result};

use crate::corpus::Corpus;
use crate::retrieval::{DEFAULT_TOP_K, RetrievalEngine};

/// System instructions sent with every question
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based on the provided bookmark content. If the content doesn't contain relevant information, say so.";

const CONTEXT_HEADER: &str = "Here are the most relevant parts of my bookmarks:\n\n";

/// Answer to one question plus the segments it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<RankedResult>,
    /// False when nothing was retrieved and no completion was requested
    pub has_context: bool,
}

/// Retrieval-augmented chat over a corpus
pub struct BookmarkChat<E, L> {
    embedder: Arc<E>,
    completer: Arc<L>,
    corpus: Corpus,
    retrieval: RetrievalEngine,
    top_k: usize,
}

impl<E: EmbeddingProvider, L: CompletionProvider> BookmarkChat<E, L> {
    pub fn new(embedder: Arc<E>, completer: Arc<L>, corpus: Corpus) -> Self {
        Self {
            embedder,
            completer,
            corpus,
            retrieval: RetrievalEngine::new(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Number of segments handed to the completion model per question
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_retrieval(mut self, retrieval: RetrievalEngine) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Embed the question and rank the corpus against it
    pub async fn retrieve(&self, question: &str) -> Result<Vec<RankedResult>> {
        if self.corpus.is_empty() || self.top_k == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(question).await?;
        let ranking = self.corpus.rank(&self.retrieval, &query, self.top_k)?;
        debug!(
            results = ranking.results.len(),
            skipped = ranking.skipped,
            "retrieved segments"
        );
        Ok(ranking.results)
    }

    /// Render retrieved segments as the context block of the prompt
    pub fn build_context(&self, results: &[RankedResult]) -> String {
        if results.is_empty() {
            return String::new();
        }

        let mut context = String::from(CONTEXT_HEADER);
        for result in results {
            context.push_str(&format!("Title: {}\n", result.segment.source_title));
            context.push_str(&format!("URL: {}\n", result.segment.source_url));
            context.push_str(&format!("Content: {}\n\n", result.segment.text));
        }
        context
    }

    pub fn build_prompt(&self, question: &str, results: &[RankedResult]) -> ChatPrompt {
        let context = self.build_context(results);
        ChatPrompt::new(
            SYSTEM_PROMPT,
            format!("Context:\n{}\n\nQuestion: {}", context, question),
        )
    }

    /// Retrieve, then ask the completion model.
    ///
    /// With nothing retrieved the model is not called.
    pub async fn ask(&self, question: &str) -> Result<ChatAnswer> {
        let sources = self.retrieve(question).await?;
        if sources.is_empty() {
            info!("no relevant segments found");
            return Ok(ChatAnswer {
                answer: String::new(),
                sources,
                has_context: false,
            });
        }

        let prompt = self.build_prompt(question, &sources);
        let answer = self.completer.complete(&prompt).await?;

        Ok(ChatAnswer {
            answer,
            sources,
            has_context: true,
        })
    }
}
