use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bmchat_cli::{
    Settings, StoreSink, display_banner, is_exit_command, print_answer, print_error, print_report,
    print_segments, read_question,
};
use bmchat_core::{Document, TokenCounter};
use bmchat_openai::OpenAiClient;
use bmchat_rag::{
    BookmarkChat, Checkpoint, Chunker, EmbeddingPipeline, EmbeddingStore, RetrievalEngine,
    UnicodeSentenceSplitter, load_document, load_documents,
};

#[derive(Parser)]
#[command(name = "bmchat")]
#[command(about = "Chat with your saved bookmarks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a page (or a directory of pages) into token-budgeted chunks
    Chunk {
        /// Text file, cached page JSON, or directory of cached pages
        path: PathBuf,
        /// Token budget per chunk
        #[arg(long)]
        target_tokens: Option<usize>,
    },
    /// Embed cached pages and write one record file per bookmark
    Embed {
        /// Forget previous progress before starting
        #[arg(long)]
        clean: bool,
        #[arg(long)]
        pages_dir: Option<PathBuf>,
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Ask questions about your bookmarks
    Chat {
        /// Answer a single question and exit
        #[arg(short, long)]
        question: Option<String>,
        #[arg(long)]
        top_k: Option<usize>,
        /// Skip stored segments whose embedding size differs from the question's
        #[arg(long)]
        lenient: bool,
    },
}

type SharedChunker = Chunker<Arc<dyn TokenCounter>, UnicodeSentenceSplitter>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut settings = Settings::from_env()?;

    match cli.command {
        Commands::Chunk {
            path,
            target_tokens,
        } => {
            if let Some(target) = target_tokens {
                settings.target_tokens = target;
            }
            run_chunk(&settings, &path)
        }
        Commands::Embed {
            clean,
            pages_dir,
            batch_size,
        } => {
            if let Some(size) = batch_size {
                settings.batch_size = size;
            }
            let pages_dir = pages_dir.unwrap_or_else(|| settings.pages_dir());
            run_embed(&settings, &pages_dir, clean).await
        }
        Commands::Chat {
            question,
            top_k,
            lenient,
        } => {
            if let Some(k) = top_k {
                settings.top_k = k;
            }
            run_chat(&settings, question, lenient).await
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_chunker(settings: &Settings) -> Result<SharedChunker> {
    let counter = settings.tokenizer.build()?;
    info!(tokenizer = %settings.tokenizer, target_tokens = settings.target_tokens, "chunker ready");
    Ok(Chunker::new(
        counter,
        UnicodeSentenceSplitter,
        settings.target_tokens,
    )?)
}

/// Read a cached page (`.json`) or a plain text file
fn load_input(path: &Path) -> Result<Document> {
    if path.extension().is_some_and(|ext| ext == "json") {
        return Ok(load_document(path)?);
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path.display().to_string();
    Ok(Document::new(name.clone(), name, text))
}

fn run_chunk(settings: &Settings, path: &Path) -> Result<()> {
    let chunker = build_chunker(settings)?;

    let documents = if path.is_dir() {
        load_documents(path)?
    } else {
        vec![load_input(path)?]
    };

    let mut total = 0;
    for document in &documents {
        let segments = chunker.chunk_document(document)?;
        total += segments.len();
        print_segments(&document.url, &segments);
    }

    if documents.len() > 1 {
        println!();
        println!("{} {}", "Total chunks across all files:".bold(), total);
    }
    Ok(())
}

async fn run_embed(settings: &Settings, pages_dir: &Path, clean: bool) -> Result<()> {
    let checkpoint_path = settings.checkpoint_path();
    if clean && Checkpoint::clean(&checkpoint_path)? {
        println!("{} Progress file cleaned", "🧹".cyan());
    }

    let documents = load_documents(pages_dir)?;
    if documents.is_empty() {
        warn!(dir = %pages_dir.display(), "no cached pages found");
        println!(
            "{} No cached pages found in {}",
            "⚠️".yellow(),
            pages_dir.display()
        );
        return Ok(());
    }
    println!("{} Loaded {} pages", "📄".blue(), documents.len());

    let client = Arc::new(OpenAiClient::from_env()?);
    let pipeline = EmbeddingPipeline::new(build_chunker(settings)?, client, settings.pipeline_config())?;

    let mut checkpoint = Checkpoint::load(&checkpoint_path)?;
    let mut sink = StoreSink::new(EmbeddingStore::new(settings.embeddings_dir()), checkpoint_path);

    let report = pipeline.run(&documents, &mut checkpoint, &mut sink).await?;
    print_report(&report);
    Ok(())
}

fn retrieval_engine(lenient: bool) -> RetrievalEngine {
    if lenient {
        RetrievalEngine::lenient()
    } else {
        RetrievalEngine::new()
    }
}

async fn run_chat(settings: &Settings, question: Option<String>, lenient: bool) -> Result<()> {
    let store = EmbeddingStore::new(settings.embeddings_dir());
    let corpus = store.load_corpus()?;
    if corpus.is_empty() {
        println!(
            "{} No embeddings found. Please run `bmchat embed` first.",
            "⚠️".yellow()
        );
        return Ok(());
    }

    let client = Arc::new(OpenAiClient::from_env()?);
    let bookmarks = corpus.document_count();
    let segments = corpus.len();
    let chat = BookmarkChat::new(client.clone(), client, corpus)
        .with_top_k(settings.top_k)
        .with_retrieval(retrieval_engine(lenient));

    if let Some(question) = question {
        let answer = chat.ask(&question).await?;
        print_answer(&answer);
        return Ok(());
    }

    display_banner(bookmarks, segments);

    while let Some(input) = read_question()? {
        if input.is_empty() {
            continue;
        }
        if is_exit_command(&input) {
            break;
        }

        match chat.ask(&input).await {
            Ok(answer) => print_answer(&answer),
            Err(e) => print_error(&e.to_string()),
        }
    }

    println!("{}", "👋 Goodbye!".green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["bmchat", "embed", "--clean", "--batch-size", "3"]);
        match cli.command {
            Commands::Embed {
                clean, batch_size, ..
            } => {
                assert!(clean);
                assert_eq!(batch_size, Some(3));
            }
            _ => panic!("expected embed"),
        }

        let cli = Cli::parse_from(["bmchat", "chat", "-q", "what is rust?"]);
        assert!(matches!(
            cli.command,
            Commands::Chat {
                question: Some(_),
                top_k: None,
                lenient: false
            }
        ));

        let cli = Cli::parse_from(["bmchat", "chat", "--lenient", "--top-k", "2"]);
        assert!(matches!(
            cli.command,
            Commands::Chat {
                question: None,
                top_k: Some(2),
                lenient: true
            }
        ));
    }

    #[test]
    fn test_lenient_flag_selects_skip_policy() {
        use bmchat_core::{EmbeddingRecord, Segment};
        use bmchat_rag::Corpus;

        let segment = |index: usize| Segment {
            sequence_index: index,
            text: "text".to_string(),
            token_count: 1,
            source_url: "https://a.example".to_string(),
            source_title: "A".to_string(),
        };
        let corpus: Corpus = vec![
            EmbeddingRecord::new(segment(0), vec![1.0, 0.0]),
            EmbeddingRecord::new(segment(1), vec![1.0, 0.0, 0.0]),
        ]
        .into_iter()
        .collect();

        assert!(corpus.rank(&retrieval_engine(false), &[1.0, 0.0], 2).is_err());
        let ranking = corpus.rank(&retrieval_engine(true), &[1.0, 0.0], 2).unwrap();
        assert_eq!(ranking.results.len(), 1);
        assert_eq!(ranking.skipped, 1);
    }

    #[test]
    fn test_load_input_text_and_json() {
        let dir = TempDir::new().unwrap();

        let text_path = dir.path().join("page.txt");
        fs::write(&text_path, "Plain text page.").unwrap();
        let document = load_input(&text_path).unwrap();
        assert_eq!(document.text, "Plain text page.");
        assert_eq!(document.url, text_path.display().to_string());

        let json_path = dir.path().join("page.json");
        fs::write(
            &json_path,
            r#"{"url": "https://example.com", "title": "Example", "text": "Cached."}"#,
        )
        .unwrap();
        let document = load_input(&json_path).unwrap();
        assert_eq!(document.url, "https://example.com");
    }
}
