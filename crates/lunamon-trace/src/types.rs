use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which way a message crossed the monitor's vantage point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `TX` in the trace.
    Outbound,
    /// `RX` in the trace.
    Inbound,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "TX" => Some(Direction::Outbound),
            "RX" => Some(Direction::Inbound),
            _ => None,
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            Direction::Outbound => "TX",
            Direction::Inbound => "RX",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Whether a message is a request or a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Call,
    Return,
}

impl Kind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "call" => Some(Kind::Call),
            "return" => Some(Kind::Return),
            _ => None,
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            Kind::Call => "call",
            Kind::Return => "return",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// A single parsed trace line.
///
/// `client`/`service` are derived roles, see [`crate::extractor::derive_roles`].
/// They are not necessarily equal to `sender`/`destination`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: f64,
    pub direction: Direction,
    pub kind: Kind,
    pub token: u64,

    pub sender: String,
    pub sender_socket: String,
    pub destination: String,
    pub destination_socket: String,

    pub client: String,
    pub client_socket: String,
    pub service: String,
    pub service_socket: String,

    pub app_id: Option<String>,
    pub method: Option<String>,
    pub body: Value,
}

impl Record {
    pub fn is_outbound(&self) -> bool {
        self.direction == Direction::Outbound
    }

    pub fn is_call(&self) -> bool {
        self.kind == Kind::Call
    }
}

/// A call together with the replies (and cancellation) correlated to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    pub call: Arc<Record>,
    /// In arrival order.
    pub responses: Vec<Arc<Record>>,
}

impl CallRecord {
    pub fn new(call: Arc<Record>) -> Self {
        Self {
            call,
            responses: Vec::new(),
        }
    }

    /// More than one reply means the caller subscribed.
    pub fn is_subscription(&self) -> bool {
        self.responses.len() > 1
    }
}
