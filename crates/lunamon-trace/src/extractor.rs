//! Record extraction from the head of the trace buffer.
//!
//! A trace line looks like:
//!
//! ```text
//! 12.5 TX call 7 com.app (s1) com.service (s2) app1 /foo/bar «{"a":1}»
//! ```
//!
//! The `<app id> <method>` pair is present on calls and absent on most returns.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::trace;

use crate::error::TraceError;
use crate::types::{Direction, Kind, Record};

lazy_static! {
    // Header tokens never contain the body delimiters, so a match can't
    // reach past the `»\n` that ends its own line.
    static ref RECORD_RE: Regex = Regex::new(concat!(
        r"(?P<ts>[0-9]+\.[0-9]+)\s+(?P<dir>RX|TX)\s+(?P<kind>call|return)\s+(?P<token>[0-9]+)\s+",
        r"(?P<sender>[^\s«»]+)\s+\((?P<sender_sock>[^)]+)\)\s+",
        r"(?P<destination>[^\s«»]*)\s+\((?P<destination_sock>[^)]+)\)\s+",
        r"(?:(?P<app_id>[^\s«»]*)\s+(?P<method>[^\s«»]+)\s+|)",
        r"«(?P<body>[^»]+)»\n",
    ))
    .expect("invalid regex");
}

/// Which raw endpoint plays the client role for a given record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perspective {
    SenderIsClient,
    DestinationIsClient,
}

/// The "flip" rule.
///
/// An outbound call is issued by the vantage point acting as client. An
/// outbound return is the vantage point relaying a service's reply, so the
/// reply's destination is the logical client. Inbound traffic mirrors this.
pub fn derive_roles(direction: Direction, kind: Kind) -> Perspective {
    match (direction, kind) {
        (Direction::Outbound, Kind::Call) => Perspective::SenderIsClient,
        (Direction::Outbound, Kind::Return) => Perspective::DestinationIsClient,
        (Direction::Inbound, Kind::Call) => Perspective::DestinationIsClient,
        (Direction::Inbound, Kind::Return) => Perspective::SenderIsClient,
    }
}

/// Outcome of one extraction attempt.
///
/// `skipped` is the length of leading noise in front of the match and
/// `consumed` covers the noise plus the record itself; both are byte offsets
/// into the buffer that was passed in.
#[derive(Debug)]
pub enum Extraction {
    /// No complete record in the buffer yet. Nothing was consumed.
    Incomplete,
    Record {
        record: Record,
        skipped: usize,
        consumed: usize,
    },
    /// A line matched structurally but could not be decoded.
    Discarded {
        error: TraceError,
        skipped: usize,
        consumed: usize,
    },
}

impl Extraction {
    /// Bytes to drop from the buffer head.
    pub fn consumed(&self) -> usize {
        match self {
            Extraction::Incomplete => 0,
            Extraction::Record { consumed, .. } | Extraction::Discarded { consumed, .. } => {
                *consumed
            }
        }
    }
}

/// Matches and decodes one record at a time.
pub struct RecordExtractor;

impl RecordExtractor {
    /// Try to extract the first complete record in `buffer`.
    ///
    /// Extraction is all-or-nothing: a record that is still missing its
    /// terminating `»\n` is never matched.
    pub fn extract(buffer: &str) -> Extraction {
        let Some(caps) = RECORD_RE.captures(buffer) else {
            return Extraction::Incomplete;
        };
        let Some(whole) = caps.get(0) else {
            return Extraction::Incomplete;
        };

        let skipped = whole.start();
        let consumed = whole.end();

        match Self::decode(&caps) {
            Ok(record) => {
                trace!(token = record.token, kind = %record.kind, "Extracted record");
                Extraction::Record {
                    record,
                    skipped,
                    consumed,
                }
            }
            Err(error) => Extraction::Discarded {
                error,
                skipped,
                consumed,
            },
        }
    }

    fn decode(caps: &Captures<'_>) -> Result<Record, TraceError> {
        let timestamp = parse_field::<f64>(caps, "ts", "timestamp")?;
        let token = parse_field::<u64>(caps, "token", "token")?;

        let direction =
            Direction::from_token(&caps["dir"]).ok_or_else(|| TraceError::InvalidField {
                field: "direction",
                value: caps["dir"].to_string(),
            })?;
        let kind = Kind::from_token(&caps["kind"]).ok_or_else(|| TraceError::InvalidField {
            field: "kind",
            value: caps["kind"].to_string(),
        })?;

        let body: Value = serde_json::from_str(&caps["body"])?;

        let sender = caps["sender"].to_string();
        let sender_socket = caps["sender_sock"].to_string();
        let destination = caps["destination"].to_string();
        let destination_socket = caps["destination_sock"].to_string();

        let (client, client_socket, service, service_socket) = match derive_roles(direction, kind)
        {
            Perspective::SenderIsClient => (
                sender.clone(),
                sender_socket.clone(),
                destination.clone(),
                destination_socket.clone(),
            ),
            Perspective::DestinationIsClient => (
                destination.clone(),
                destination_socket.clone(),
                sender.clone(),
                sender_socket.clone(),
            ),
        };

        Ok(Record {
            timestamp,
            direction,
            kind,
            token,
            sender,
            sender_socket,
            destination,
            destination_socket,
            client,
            client_socket,
            service,
            service_socket,
            app_id: caps.name("app_id").map(|m| m.as_str().to_string()),
            method: caps.name("method").map(|m| m.as_str().to_string()),
            body,
        })
    }
}

fn parse_field<T: std::str::FromStr>(
    caps: &Captures<'_>,
    group: &str,
    field: &'static str,
) -> Result<T, TraceError> {
    let raw = &caps[group];
    raw.parse().map_err(|_| TraceError::InvalidField {
        field,
        value: raw.to_string(),
    })
}
