//! Persists pipeline output to the data directory

use std::path::PathBuf;

use tracing::debug;

use bmchat_core::{Document, EmbeddingRecord, Result};
use bmchat_rag::{BookmarkEmbeddings, Checkpoint, EmbeddingStore, PipelineSink};

/// Writes one record file per document and saves the checkpoint after each
pub struct StoreSink {
    store: EmbeddingStore,
    checkpoint_path: PathBuf,
}

impl StoreSink {
    pub fn new(store: EmbeddingStore, checkpoint_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            checkpoint_path: checkpoint_path.into(),
        }
    }
}

impl PipelineSink for StoreSink {
    fn document_embedded(&mut self, document: &Document, records: &[EmbeddingRecord]) -> Result<()> {
        let bookmark = BookmarkEmbeddings::from_records(document, records);
        self.store.save(&bookmark)?;
        Ok(())
    }

    fn checkpoint_updated(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        checkpoint.save(&self.checkpoint_path)?;
        debug!(urls = checkpoint.len(), "checkpoint saved");
        Ok(())
    }
}
