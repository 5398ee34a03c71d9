//! Snapshot tests for terminal output

#[cfg(test)]
mod snapshot_tests {
    use crate::{format_segment, format_source};
    use bmchat_core::{RankedResult, Segment};
    use insta::assert_snapshot;

    fn segment(text: &str) -> Segment {
        Segment {
            sequence_index: 1,
            text: text.to_string(),
            token_count: 42,
            source_url: "https://doc.rust-lang.org/book".to_string(),
            source_title: "The Rust Book".to_string(),
        }
    }

    #[test]
    fn test_format_source_snapshot() {
        let result = RankedResult {
            segment: segment("Ownership is a set of rules that govern memory."),
            score: 0.8127,
        };

        assert_snapshot!(format_source(1, &result), @r###"
        1. Title: The Rust Book
           URL: https://doc.rust-lang.org/book
           Score: 0.813
           Content: Ownership is a set of rules that govern memory.
        "###);
    }

    #[test]
    fn test_format_segment_truncates() {
        let long = "word ".repeat(60);
        let rendered = format_segment(&segment(long.trim_end()));

        assert!(rendered.starts_with("Chunk 2 (42 tokens):\n"));
        assert!(rendered.ends_with("..."));
        assert_eq!(rendered.lines().nth(1).unwrap().chars().count(), 203);
    }
}
