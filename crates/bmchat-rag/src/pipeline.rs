//! Chunk-and-embed orchestration with batching and resumable progress

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use bmchat_core::{
    Document, EmbeddingProvider, EmbeddingRecord, Error, Result, SentenceSplitter, TokenCounter,
};

use crate::checkpoint::Checkpoint;
use crate::chunker::Chunker;

/// Batching and pacing for calls to the embedding provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Documents per batch
    pub batch_size: usize,
    /// Pause after a batch that embedded at least one document
    pub batch_delay: Duration,
    /// Pause between consecutive embedding calls
    pub chunk_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay: Duration::from_secs(2),
            chunk_delay: Duration::from_millis(200),
        }
    }
}

/// Summary of a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexingReport {
    pub documents_indexed: usize,
    pub documents_skipped: usize,
    pub documents_failed: usize,
    pub chunks_embedded: usize,
    pub errors: Vec<String>,
}

/// Receives pipeline output as it is produced
pub trait PipelineSink {
    /// Persist the records of a fully embedded document.
    ///
    /// An error here stops the run; the document is not marked processed.
    fn document_embedded(&mut self, document: &Document, records: &[EmbeddingRecord]) -> Result<()>;

    /// Called after the checkpoint gained a URL
    fn checkpoint_updated(&mut self, _checkpoint: &Checkpoint) -> Result<()> {
        Ok(())
    }
}

/// Chunks documents and embeds every chunk through the provider
pub struct EmbeddingPipeline<C, S, E> {
    chunker: Chunker<C, S>,
    provider: Arc<E>,
    config: PipelineConfig,
}

impl<C, S, E> EmbeddingPipeline<C, S, E>
where
    C: TokenCounter,
    S: SentenceSplitter,
    E: EmbeddingProvider,
{
    pub fn new(chunker: Chunker<C, S>, provider: Arc<E>, config: PipelineConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(Error::InvalidInput(
                "batch_size must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            chunker,
            provider,
            config,
        })
    }

    pub fn chunker(&self) -> &Chunker<C, S> {
        &self.chunker
    }

    /// Chunk one document and embed each segment, in order.
    ///
    /// The first failure aborts the document; no partial result is returned.
    pub async fn embed_document(&self, document: &Document) -> Result<Vec<EmbeddingRecord>> {
        let segments = self.chunker.chunk_document(document)?;
        let mut records = Vec::with_capacity(segments.len());

        for (i, segment) in segments.into_iter().enumerate() {
            if i > 0 && !self.config.chunk_delay.is_zero() {
                tokio::time::sleep(self.config.chunk_delay).await;
            }
            let vector = self.provider.embed(&segment.text).await?;
            records.push(EmbeddingRecord::new(segment, vector));
        }

        Ok(records)
    }

    /// Embed every document not yet in `checkpoint`.
    ///
    /// Failed documents are reported and left out of the checkpoint so a
    /// later run retries them.
    pub async fn run<K: PipelineSink>(
        &self,
        documents: &[Document],
        checkpoint: &mut Checkpoint,
        sink: &mut K,
    ) -> Result<IndexingReport> {
        let mut report = IndexingReport::default();
        let batch_count = documents.len().div_ceil(self.config.batch_size);

        for (batch_index, batch) in documents.chunks(self.config.batch_size).enumerate() {
            info!(batch = batch_index + 1, batches = batch_count, "processing batch");
            let mut batch_processed = false;

            for document in batch {
                if checkpoint.is_processed(&document.url) {
                    info!(url = %document.url, "skipping already processed url");
                    report.documents_skipped += 1;
                    continue;
                }

                if document.text.trim().is_empty() {
                    warn!(url = %document.url, "no content found");
                    report.documents_skipped += 1;
                    continue;
                }

                let records = match self.embed_document(document).await {
                    Ok(records) => records,
                    Err(e) => {
                        if e.is_text_analysis_failure() {
                            warn!(url = %document.url, error = %e, "failed to chunk document");
                        } else {
                            warn!(url = %document.url, error = %e, "failed to embed document");
                        }
                        report.documents_failed += 1;
                        report.errors.push(format!("{}: {}", document.url, e));
                        continue;
                    }
                };

                if records.is_empty() {
                    report.documents_skipped += 1;
                    continue;
                }

                sink.document_embedded(document, &records)?;
                checkpoint.mark_processed(document.url.clone());
                sink.checkpoint_updated(checkpoint)?;

                info!(url = %document.url, chunks = records.len(), "embedded document");
                report.documents_indexed += 1;
                report.chunks_embedded += records.len();
                batch_processed = true;
            }

            let more_batches = batch_index + 1 < batch_count;
            if batch_processed && more_batches && !self.config.batch_delay.is_zero() {
                info!(delay_ms = self.config.batch_delay.as_millis() as u64, "waiting before next batch");
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        Ok(report)
    }
}
