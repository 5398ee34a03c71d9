//! Runtime settings read from the environment

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use bmchat_core::{Error, Result};
use bmchat_rag::{DEFAULT_TARGET_TOKENS, DEFAULT_TOP_K, PipelineConfig, TokenizerKind};

/// Settings shared by the `chunk`, `embed` and `chat` commands
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub target_tokens: usize,
    pub top_k: usize,
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub chunk_delay: Duration,
    pub tokenizer: TokenizerKind,
}

impl Default for Settings {
    fn default() -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            data_dir: PathBuf::from("data"),
            target_tokens: DEFAULT_TARGET_TOKENS,
            top_k: DEFAULT_TOP_K,
            batch_size: pipeline.batch_size,
            batch_delay: pipeline.batch_delay,
            chunk_delay: pipeline.chunk_delay,
            tokenizer: TokenizerKind::Tiktoken,
        }
    }
}

impl Settings {
    /// Create settings from environment variables (and `.env`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from any variable source; unset variables keep defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(dir) = lookup("BMCHAT_DATA_DIR") {
            settings.data_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("BMCHAT_TARGET_TOKENS") {
            settings.target_tokens = parse_var("BMCHAT_TARGET_TOKENS", &value)?;
        }
        if let Some(value) = lookup("BMCHAT_TOP_K") {
            settings.top_k = parse_var("BMCHAT_TOP_K", &value)?;
        }
        if let Some(value) = lookup("BMCHAT_BATCH_SIZE") {
            settings.batch_size = parse_var("BMCHAT_BATCH_SIZE", &value)?;
        }
        if let Some(value) = lookup("BMCHAT_BATCH_DELAY_MS") {
            settings.batch_delay = Duration::from_millis(parse_var("BMCHAT_BATCH_DELAY_MS", &value)?);
        }
        if let Some(value) = lookup("BMCHAT_CHUNK_DELAY_MS") {
            settings.chunk_delay = Duration::from_millis(parse_var("BMCHAT_CHUNK_DELAY_MS", &value)?);
        }
        if let Some(value) = lookup("BMCHAT_TOKENIZER") {
            settings.tokenizer = TokenizerKind::from_str(&value).ok_or_else(|| {
                Error::Configuration(format!(
                    "BMCHAT_TOKENIZER must be 'tiktoken' or 'heuristic', got '{}'",
                    value
                ))
            })?;
        }

        Ok(settings)
    }

    /// Cached pages, one JSON document per file
    pub fn pages_dir(&self) -> PathBuf {
        self.data_dir.join("cache").join("pages")
    }

    pub fn embeddings_dir(&self) -> PathBuf {
        self.data_dir.join("embeddings")
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.data_dir.join("cache").join("embedder_progress.json")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            batch_size: self.batch_size,
            batch_delay: self.batch_delay,
            chunk_delay: self.chunk_delay,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        Error::Configuration(format!("{} has an invalid value: '{}'", name, value))
    })
}
