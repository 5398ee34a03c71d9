//! In-memory corpus of embedded segments

use std::collections::HashMap;

use tracing::warn;

use bmchat_core::{EmbeddingRecord, Result};

use crate::retrieval::{Ranking, RetrievalEngine};

/// Embedded segments keyed by `(source_url, sequence_index)`
///
/// Iteration follows insertion order. Inserting a record whose key is
/// already present replaces the stored record in place.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Vec<EmbeddingRecord>,
    positions: HashMap<(String, usize), usize>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, returning the one it replaced if the key was taken
    pub fn insert(&mut self, record: EmbeddingRecord) -> Option<EmbeddingRecord> {
        let (url, index) = record.segment.key();
        let key = (url.to_string(), index);

        match self.positions.get(&key) {
            Some(&position) => {
                warn!(
                    record = %record.label(),
                    "duplicate corpus key, keeping the latest record"
                );
                Some(std::mem::replace(&mut self.records[position], record))
            }
            None => {
                self.positions.insert(key, self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    /// Look up a record by its key
    pub fn get(&self, url: &str, sequence_index: usize) -> Option<&EmbeddingRecord> {
        self.positions
            .get(&(url.to_string(), sequence_index))
            .map(|&position| &self.records[position])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EmbeddingRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[EmbeddingRecord] {
        &self.records
    }

    /// Number of distinct source documents
    pub fn document_count(&self) -> usize {
        let mut urls: Vec<&str> = self
            .records
            .iter()
            .map(|r| r.segment.source_url.as_str())
            .collect();
        urls.sort_unstable();
        urls.dedup();
        urls.len()
    }

    /// Dimensionality of the first record, if any
    pub fn dimension(&self) -> Option<usize> {
        self.records.first().map(EmbeddingRecord::dimension)
    }

    /// Rank this corpus against a query vector
    pub fn rank(&self, engine: &RetrievalEngine, query: &[f32], k: usize) -> Result<Ranking> {
        engine.rank(self.records.iter(), query, k)
    }
}

impl FromIterator<EmbeddingRecord> for Corpus {
    fn from_iter<I: IntoIterator<Item = EmbeddingRecord>>(iter: I) -> Self {
        let mut corpus = Corpus::new();
        corpus.extend(iter);
        corpus
    }
}

impl Extend<EmbeddingRecord> for Corpus {
    fn extend<I: IntoIterator<Item = EmbeddingRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a EmbeddingRecord;
    type IntoIter = std::slice::Iter<'a, EmbeddingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
