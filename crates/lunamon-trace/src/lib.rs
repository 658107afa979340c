//! # lunamon-trace
//!
//! Parser and correlation engine for the bus monitor's trace stream.
//!
//! ## Key Types
//!
//! - [`StreamAssembler`] - Buffers chunks and drains complete records
//! - [`RecordExtractor`] - Decodes one record and derives client/service roles
//! - [`RecordStore`] - Append-only, newest-first record holder
//! - [`CorrelationIndex`] - Pairs calls with their returns and cancellations
//! - [`FilterSpec`] - Display filter for the flat view
//! - [`MonitorSession`] - Ties the above together for one live feed
//!
//! Everything here is synchronous and performs no I/O.

pub mod assembler;
pub mod correlate;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod replay;
pub mod session;
pub mod store;
pub mod types;

pub use assembler::{AssemblerState, StreamAssembler};
pub use correlate::{correlate, correlate_chronological, CorrelationIndex, CANCEL_METHOD};
pub use error::TraceError;
pub use extractor::{derive_roles, Extraction, Perspective, RecordExtractor};
pub use filter::{filter_records, FilterSpec};
pub use replay::{replay_call, replay_record, ReplayMode, REPLAY_TOOL};
pub use session::MonitorSession;
pub use store::RecordStore;
pub use types::{CallRecord, Direction, Kind, Record};
