//! Chunking, retrieval and indexing for bmchat
//!
//! This crate holds the token-budgeted chunker, the cosine-similarity
//! retrieval engine, the on-disk embedding store and the pipeline that ties
//! chunking to an embedding provider.

pub mod checkpoint;
pub mod chunker;
pub mod corpus;
pub mod engine;
pub mod pipeline;
pub mod retrieval;
pub mod store;
pub mod tokenizers;


pub use checkpoint::{CHECKPOINT_VERSION, Checkpoint};
pub use chunker::{Chunker, DEFAULT_TARGET_TOKENS};
pub use corpus::Corpus;
pub use engine::{BookmarkChat, ChatAnswer, SYSTEM_PROMPT};
pub use pipeline::{EmbeddingPipeline, IndexingReport, PipelineConfig, PipelineSink};
pub use retrieval::{DEFAULT_TOP_K, DimensionPolicy, Ranking, RetrievalEngine, cosine_similarity};
pub use store::{BookmarkEmbeddings, EmbeddingStore, StoredChunk, load_document, load_documents, url_hash};
pub use tokenizers::{HeuristicTokenCounter, TiktokenCounter, TokenizerKind, UnicodeSentenceSplitter};

// Re-export core types for convenience
pub use bmchat_core::{
    ChatPrompt, CompletionProvider, Document, EmbeddingProvider, EmbeddingRecord, Error,
    RankedResult, Result, Segment, SentenceSplitter, TokenCounter,
};
