//! Progress checkpoint for the embedding pipeline
//!
//! The checkpoint records which URLs have been fully embedded so an
//! interrupted run can resume. It is an explicit value owned by the caller:
//! load it, hand it to the pipeline, save it.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use bmchat_core::{Error, Result};

/// Current on-disk format version
pub const CHECKPOINT_VERSION: u32 = 1;

/// Set of processed URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub processed: BTreeSet<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            processed: BTreeSet::new(),
            updated_at: None,
        }
    }
}

impl Checkpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a checkpoint, or start empty if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let checkpoint: Checkpoint = serde_json::from_str(&content)
            .map_err(|e| Error::Checkpoint(format!("{}: {}", path.display(), e)))?;

        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(Error::Checkpoint(format!(
                "unsupported checkpoint version {} (expected {})",
                checkpoint.version, CHECKPOINT_VERSION
            )));
        }

        info!(path = %path.display(), urls = checkpoint.processed.len(), "loaded checkpoint");
        Ok(checkpoint)
    }

    /// Write the checkpoint, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Delete the checkpoint file; a missing file is not an error
    pub fn clean(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        info!(path = %path.display(), "removed checkpoint");
        Ok(true)
    }

    pub fn is_processed(&self, url: &str) -> bool {
        self.processed.contains(url)
    }

    /// Record `url` as done; returns false if it already was
    pub fn mark_processed(&mut self, url: impl Into<String>) -> bool {
        let inserted = self.processed.insert(url.into());
        if inserted {
            self.updated_at = Some(Utc::now());
        }
        inserted
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}
