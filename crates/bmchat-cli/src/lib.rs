//! Terminal interface for bmchat
//!
//! Settings, the on-disk pipeline sink and the printing helpers used by the
//! `bmchat` binary.

mod config;
mod sink;
mod ui;

#[cfg(test)]
mod tests;

pub use config::Settings;
pub use sink::StoreSink;
pub use ui::{
    PREVIEW_CHARS, display_banner, format_segment, format_source, is_exit_command, preview,
    print_answer, print_error, print_report, print_segments, read_question,
};

// Re-export core types
pub use bmchat_core::{Error, Result};
