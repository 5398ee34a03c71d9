//! UI utilities for the CLI

use colored::*;
use std::io::{self, BufRead, Write};

use bmchat_core::{RankedResult, Result, Segment};
use bmchat_rag::{ChatAnswer, IndexingReport};

/// Characters of segment text shown in previews
pub const PREVIEW_CHARS: usize = 200;

const RULE_WIDTH: usize = 80;

/// Display startup banner for the interactive chat
pub fn display_banner(bookmarks: usize, segments: usize) {
    let width = 56;
    let top_border = format!("┌{}┐", "─".repeat(width - 2));
    let bottom_border = format!("└{}┘", "─".repeat(width - 2));

    println!();
    println!("{}", top_border.blue());
    let title = "bmchat - chat with your bookmarks";
    println!(
        "{}  {}{}{}",
        "│".blue(),
        title.blue().bold(),
        " ".repeat(width - title.len() - 4),
        "│".blue()
    );
    println!("{}", bottom_border.blue());
    println!(
        "{}",
        format!("Loaded {} bookmarks ({} segments)", bookmarks, segments).dimmed()
    );
    println!("{}", "Type 'quit' or 'exit' to leave".dimmed());
    println!();
}

/// Prompt for a question; `None` on end of input
pub fn read_question() -> Result<Option<String>> {
    print!("{} ", "Your question:".green().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    let read = io::stdin().lock().read_line(&mut input)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// True for the words that end the chat loop
pub fn is_exit_command(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "quit" | "exit")
}

/// First `max_chars` characters of `text`, marked when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Plain-text rendering of one source under an answer
pub fn format_source(rank: usize, result: &RankedResult) -> String {
    format!(
        "{}. Title: {}\n   URL: {}\n   Score: {:.3}\n   Content: {}",
        rank,
        result.segment.source_title,
        result.segment.source_url,
        result.score,
        preview(&result.segment.text, PREVIEW_CHARS)
    )
}

/// Plain-text rendering of a segment for the `chunk` command
pub fn format_segment(segment: &Segment) -> String {
    format!(
        "Chunk {} ({} tokens):\n{}",
        segment.sequence_index + 1,
        segment.token_count,
        preview(&segment.text, PREVIEW_CHARS)
    )
}

pub fn print_answer(answer: &ChatAnswer) {
    if !answer.has_context {
        println!("{}", "No relevant content found in bookmarks.".yellow());
        return;
    }

    println!();
    println!("{}", "Response:".bold());
    println!("{}", answer.answer);
    println!();
    println!(
        "{}",
        format!("Top {} Most Relevant Bookmarks:", answer.sources.len()).bold()
    );
    println!("{}", "-".repeat(RULE_WIDTH).dimmed());
    for (i, source) in answer.sources.iter().enumerate() {
        println!("{}", format_source(i + 1, source));
        println!("{}", "-".repeat(RULE_WIDTH).dimmed());
    }
}

pub fn print_segments(source: &str, segments: &[Segment]) {
    println!(
        "{} Split {} into {} chunks",
        "✂".cyan(),
        source.bold(),
        segments.len()
    );
    for segment in segments {
        println!();
        println!("{}", format_segment(segment));
    }
}

pub fn print_report(report: &IndexingReport) {
    println!();
    println!("{}", "Embedding complete".green().bold());
    println!("  indexed: {}", report.documents_indexed);
    println!("  skipped: {}", report.documents_skipped);
    println!("  chunks:  {}", report.chunks_embedded);
    if report.documents_failed > 0 {
        println!("  {} {}", "failed:".red(), report.documents_failed);
        for error in &report.errors {
            println!("    {} {}", "•".red(), error);
        }
    }
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}
