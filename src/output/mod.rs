//! Output module for persisting harvested pages and reporting on a run
//!
//! This module handles:
//! - Writing page records as plain text or JSON Lines
//! - Recording and printing crawl statistics

mod jsonl;
pub mod stats;
mod text;
mod traits;

pub use jsonl::JsonLinesSink;
pub use stats::{print_statistics, CrawlStatistics, StatsRecorder};
pub use text::{TextFileSink, SEPARATOR_WIDTH};
pub use traits::{OutputError, OutputResult, Sink};

use crate::config::OutputFormat;
use std::path::Path;

/// Opens the sink for `format` at `path`
///
/// The file is created immediately, so an unwritable path is reported
/// before any crawling starts.
///
/// # Arguments
///
/// * `format` - Record layout
/// * `path` - Output file, created or truncated
///
/// # Returns
///
/// * `Ok(Box<dyn Sink>)` - Ready to receive records
/// * `Err(OutputError)` - The file could not be created
pub fn open_sink(format: OutputFormat, path: &Path) -> OutputResult<Box<dyn Sink>> {
    let sink: Box<dyn Sink> = match format {
        OutputFormat::Text => Box::new(TextFileSink::create(path)?),
        OutputFormat::Jsonl => Box::new(JsonLinesSink::create(path)?),
    };

    tracing::debug!("Writing {} output to {}", format, path.display());
    Ok(sink)
}
