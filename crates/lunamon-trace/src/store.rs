use std::collections::VecDeque;
use std::sync::Arc;

use crate::types::Record;

/// Append-only holder of parsed records, newest first.
#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    records: VecDeque<Arc<Record>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record as the most recent one.
    pub fn append(&mut self, record: Record) -> Arc<Record> {
        let record = Arc::new(record);
        self.records.push_front(Arc::clone(&record));
        record
    }

    /// Discard every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Newest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<Record>> + ExactSizeIterator {
        self.records.iter()
    }

    /// Oldest first.
    pub fn chronological(&self) -> impl Iterator<Item = &Arc<Record>> {
        self.records.iter().rev()
    }
}
