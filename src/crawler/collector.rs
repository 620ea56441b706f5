//! Shared accumulation of finished page records

use parking_lot::Mutex;
use serde::Serialize;

/// One harvested page: its URL and extracted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    pub url: String,
    pub content: String,
}

impl PageRecord {
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Records in completion order
///
/// Records are only ever removed by `drain`.
#[derive(Debug, Default)]
pub struct ResultCollector {
    records: Mutex<Vec<PageRecord>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, record: PageRecord) {
        self.records.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Takes every record collected so far, oldest first
    pub fn drain(&self) -> Vec<PageRecord> {
        std::mem::take(&mut *self.records.lock())
    }
}
