use std::sync::Arc;

use tracing::debug;

use crate::assembler::StreamAssembler;
use crate::correlate::correlate;
use crate::filter::{filter_records, FilterSpec};
use crate::store::RecordStore;
use crate::types::{CallRecord, Record};

/// One monitoring session: an assembler feeding a record store.
///
/// Sessions share nothing. Dropping a session and creating a new one is how
/// a monitor is restarted.
#[derive(Debug, Default)]
pub struct MonitorSession {
    assembler: StreamAssembler,
    store: RecordStore,
}

impl MonitorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a text chunk. Returns the records it completed, oldest first.
    pub fn feed(&mut self, chunk: &str) -> Vec<Arc<Record>> {
        let records = self.assembler.append(chunk);
        self.store_all(records)
    }

    /// Feed raw transport bytes.
    pub fn feed_bytes(&mut self, chunk: &[u8]) -> Vec<Arc<Record>> {
        let records = self.assembler.append_bytes(chunk);
        self.store_all(records)
    }

    fn store_all(&mut self, records: Vec<Record>) -> Vec<Arc<Record>> {
        if !records.is_empty() {
            debug!(count = records.len(), total = self.store.len() + records.len(), "Stored records");
        }
        records
            .into_iter()
            .map(|record| self.store.append(record))
            .collect()
    }

    pub fn is_ready(&self) -> bool {
        self.assembler.is_ready()
    }

    pub fn assembler(&self) -> &StreamAssembler {
        &self.assembler
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Correlated call tree for the current snapshot, newest call first.
    pub fn calls(&self) -> Vec<CallRecord> {
        correlate(&self.store)
    }

    /// Flat view, newest first.
    pub fn filtered(&self, spec: &FilterSpec) -> Vec<Arc<Record>> {
        filter_records(self.store.iter(), spec).cloned().collect()
    }

    /// Forget every stored record. The header state is kept, since the
    /// stream itself is still running.
    pub fn clear(&mut self) {
        self.store.clear();
    }
}
