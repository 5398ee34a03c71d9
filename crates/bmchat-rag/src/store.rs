//! On-disk record schema for embedded bookmarks and cached pages
//!
//! Each bookmark is stored as one JSON file named after the MD5 hex digest
//! of its URL:
//!
//! ```json
//! { "url": "...", "title": "...", "embeddings": [ { "chunk": "...", "embedding": [0.1, ...] } ] }
//! ```
//!
//! `chunk_id` and `token_count` are written for new records and optional on
//! read, so files produced by older tooling still load.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use bmchat_core::{Document, EmbeddingRecord, Error, Result, Segment};

use crate::corpus::Corpus;

/// One embedded chunk inside a bookmark file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub chunk: String,
    pub embedding: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<usize>,
}

/// All embedded chunks of one bookmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkEmbeddings {
    pub url: String,
    pub title: String,
    pub embeddings: Vec<StoredChunk>,
}

impl BookmarkEmbeddings {
    /// Group the records of one document for storage
    pub fn from_records(document: &Document, records: &[EmbeddingRecord]) -> Self {
        Self {
            url: document.url.clone(),
            title: document.title.clone(),
            embeddings: records
                .iter()
                .map(|record| StoredChunk {
                    chunk: record.segment.text.clone(),
                    embedding: record.vector.clone(),
                    chunk_id: Some(record.segment.sequence_index),
                    token_count: Some(record.segment.token_count),
                })
                .collect(),
        }
    }

    /// Expand into corpus records; chunks without an id are numbered by position
    pub fn into_records(self) -> Vec<EmbeddingRecord> {
        let url = self.url;
        let title = self.title;

        self.embeddings
            .into_iter()
            .enumerate()
            .map(|(position, stored)| {
                EmbeddingRecord::new(
                    Segment {
                        sequence_index: stored.chunk_id.unwrap_or(position),
                        text: stored.chunk,
                        token_count: stored.token_count.unwrap_or(0),
                        source_url: url.clone(),
                        source_title: title.clone(),
                    },
                    stored.embedding,
                )
            })
            .collect()
    }
}

/// Stable file stem for a URL
pub fn url_hash(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

/// Directory of bookmark embedding files
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    dir: PathBuf,
}

impl EmbeddingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds the embeddings of `url`
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", url_hash(url)))
    }

    /// Write one bookmark, replacing any previous file for the same URL
    pub fn save(&self, bookmark: &BookmarkEmbeddings) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&bookmark.url);
        let content = serde_json::to_string_pretty(bookmark)?;
        fs::write(&path, content)?;
        debug!(url = %bookmark.url, path = %path.display(), "saved embeddings");
        Ok(path)
    }

    /// Read the stored embeddings of `url`, if present
    pub fn load(&self, url: &str) -> Result<Option<BookmarkEmbeddings>> {
        let path = self.path_for(url);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    /// Read every bookmark file in the directory.
    ///
    /// Unreadable files are logged and skipped. A missing directory yields
    /// an empty list.
    pub fn load_all(&self) -> Result<Vec<BookmarkEmbeddings>> {
        let mut bookmarks = Vec::new();
        for path in json_files(&self.dir)? {
            match read_json::<BookmarkEmbeddings>(&path) {
                Ok(bookmark) => bookmarks.push(bookmark),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable embeddings file"),
            }
        }
        Ok(bookmarks)
    }

    /// Load every stored record into a corpus
    pub fn load_corpus(&self) -> Result<Corpus> {
        Ok(self
            .load_all()?
            .into_iter()
            .flat_map(BookmarkEmbeddings::into_records)
            .collect())
    }
}

/// Read one cached page (`{"url", "title", "text"}`)
pub fn load_document(path: &Path) -> Result<Document> {
    read_json(path)
}

/// Read every cached page in a directory, skipping unreadable files
pub fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for path in json_files(dir)? {
        match load_document(&path) {
            Ok(document) => documents.push(document),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable page"),
        }
    }
    Ok(documents)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))
}

/// `*.json` files in `dir`, sorted by name so loading order is reproducible
fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    Ok(paths)
}
