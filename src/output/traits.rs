//! Output sink trait and error types
//!
//! This module defines the trait interface for record sinks. A sink receives
//! the finished page records of a run and persists them.

use crate::crawler::PageRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create output file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for record sinks
///
/// Records arrive in completion order and are written in that order.
pub trait Sink: Send {
    /// Writes a batch of records
    ///
    /// # Arguments
    ///
    /// * `records` - Page records to persist
    fn write_records(&mut self, records: &[PageRecord]) -> OutputResult<()>;

    /// Flushes anything still buffered
    fn finish(&mut self) -> OutputResult<()>;
}
