//! Plain text record sink
//!
//! Each record is written as a `URL:` header line, a `Content:` block and an
//! 80-character separator line.

use crate::crawler::PageRecord;
use crate::output::traits::{OutputError, OutputResult, Sink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Width of the line separating records
pub const SEPARATOR_WIDTH: usize = 80;

/// Writes records in the plain text layout
pub struct TextFileSink<W: Write = BufWriter<File>> {
    writer: W,
}

impl TextFileSink {
    /// Creates (or truncates) the output file
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path).map_err(|source| OutputError::Create {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TextFileSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record(&mut self, record: &PageRecord) -> OutputResult<()> {
        writeln!(self.writer, "URL: {}", record.url)?;
        writeln!(self.writer, "Content:")?;
        writeln!(self.writer, "{}", record.content)?;
        writeln!(self.writer, "{}", "-".repeat(SEPARATOR_WIDTH))?;
        Ok(())
    }
}

impl<W: Write + Send> Sink for TextFileSink<W> {
    fn write_records(&mut self, records: &[PageRecord]) -> OutputResult<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
