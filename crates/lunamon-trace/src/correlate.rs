//! Call/response correlation.
//!
//! Only outbound records take part. Calls open an entry keyed by
//! `(client socket, service socket, token)`, returns and cancellations
//! attach to the entry with the same key. Orphans are dropped silently.

use std::collections::HashMap;
use std::sync::Arc;

use crate::store::RecordStore;
use crate::types::{CallRecord, Kind, Record};

/// Method name of the bus's cancellation notification.
pub const CANCEL_METHOD: &str = "/com/palm/luna/private/cancel";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CallKey {
    client_socket: String,
    service_socket: String,
    token: u64,
}

impl CallKey {
    fn new(record: &Record, token: u64) -> Self {
        Self {
            client_socket: record.client_socket.clone(),
            service_socket: record.service_socket.clone(),
            token,
        }
    }
}

/// Builds the call tree from records fed oldest first.
#[derive(Debug, Default)]
pub struct CorrelationIndex {
    /// Key -> position in `calls`. A repeated key shadows the older entry.
    open: HashMap<CallKey, usize>,
    /// Oldest first.
    calls: Vec<CallRecord>,
}

impl CorrelationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next record in chronological order.
    pub fn ingest(&mut self, record: &Arc<Record>) {
        if !record.is_outbound() {
            return;
        }

        if record.method.as_deref() == Some(CANCEL_METHOD) {
            if let Some(token) = cancelled_token(record) {
                self.attach(CallKey::new(record, token), record);
            }
            return;
        }

        let key = CallKey::new(record, record.token);
        match record.kind {
            Kind::Call => {
                self.open.insert(key, self.calls.len());
                self.calls.push(CallRecord::new(Arc::clone(record)));
            }
            Kind::Return => self.attach(key, record),
        }
    }

    fn attach(&mut self, key: CallKey, record: &Arc<Record>) {
        if let Some(&idx) = self.open.get(&key) {
            self.calls[idx].responses.push(Arc::clone(record));
        }
    }

    /// Number of calls opened so far.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The call tree, most recently started call first.
    pub fn finish(self) -> Vec<CallRecord> {
        let mut calls = self.calls;
        calls.reverse();
        calls
    }
}

/// The token a cancellation refers to lives in its body, not its header.
fn cancelled_token(record: &Record) -> Option<u64> {
    record.body.get("token").and_then(|t| t.as_u64())
}

/// Correlate everything currently in `store`.
pub fn correlate(store: &RecordStore) -> Vec<CallRecord> {
    correlate_chronological(store.chronological())
}

/// Correlate records that are already oldest first.
pub fn correlate_chronological<'a, I>(records: I) -> Vec<CallRecord>
where
    I: IntoIterator<Item = &'a Arc<Record>>,
{
    let mut index = CorrelationIndex::new();
    for record in records {
        index.ingest(record);
    }
    index.finish()
}
