//! JSON Lines record sink: one `{"url":…,"content":…}` object per line

use crate::crawler::PageRecord;
use crate::output::traits::{OutputError, OutputResult, Sink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct JsonLinesSink<W: Write = BufWriter<File>> {
    writer: W,
}

impl JsonLinesSink {
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path).map_err(|source| OutputError::Create {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Sink for JsonLinesSink<W> {
    fn write_records(&mut self, records: &[PageRecord]) -> OutputResult<()> {
        for record in records {
            serde_json::to_writer(&mut self.writer, record)?;
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
