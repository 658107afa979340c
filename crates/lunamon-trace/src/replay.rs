//! Replay command generation.
//!
//! Produces a `luna-send` invocation that re-issues a traced call, e.g.
//!
//! ```text
//! luna-send -n 1 "luna://com.service/foo/bar" "{\"a\":1}"
//! ```

use crate::error::TraceError;
use crate::types::{CallRecord, Record};

/// The device-side tool used to send bus calls.
pub const REPLAY_TOOL: &str = "luna-send";

/// How the replayed call should wait for replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    /// `-n 1`: wait for a single reply.
    Single,
    /// `-i`: keep printing replies (subscriptions).
    Iterate,
}

impl ReplayMode {
    pub fn as_flag(&self) -> &'static str {
        match self {
            ReplayMode::Single => "-n 1",
            ReplayMode::Iterate => "-i",
        }
    }
}

/// Replay command for a bare record.
pub fn replay_record(record: &Record) -> Result<String, TraceError> {
    build(record, ReplayMode::Single)
}

/// Replay command for a correlated call.
///
/// Calls that received more than one reply are replayed interactively.
pub fn replay_call(call: &CallRecord) -> Result<String, TraceError> {
    let mode = if call.is_subscription() {
        ReplayMode::Iterate
    } else {
        ReplayMode::Single
    };
    build(&call.call, mode)
}

fn build(record: &Record, mode: ReplayMode) -> Result<String, TraceError> {
    let method = record.method.as_deref().ok_or(TraceError::MissingMethod)?;
    let uri = serde_json::to_string(&format!("luna://{}{}", record.service, method))?;
    let payload = serde_json::to_string(&serde_json::to_string(&record.body)?)?;
    Ok(format!("{} {} {} {}", REPLAY_TOOL, mode.as_flag(), uri, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, Kind};
    use serde_json::json;
    use std::sync::Arc;

    fn call(method: Option<&str>) -> Record {
        Record {
            timestamp: 1.0,
            direction: Direction::Outbound,
            kind: Kind::Call,
            token: 3,
            sender: "com.app".into(),
            sender_socket: "s1".into(),
            destination: "com.service".into(),
            destination_socket: "s2".into(),
            client: "com.app".into(),
            client_socket: "s1".into(),
            service: "com.service".into(),
            service_socket: "s2".into(),
            app_id: Some("app1".into()),
            method: method.map(String::from),
            body: json!({"a": 1}),
        }
    }

    #[test]
    fn test_replay_record_single() {
        let cmd = replay_record(&call(Some("/foo/bar"))).unwrap();
        assert_eq!(
            cmd,
            r#"luna-send -n 1 "luna://com.service/foo/bar" "{\"a\":1}""#
        );
    }

    #[test]
    fn test_replay_call_mode_follows_response_count() {
        let record = Arc::new(call(Some("/foo/bar")));
        let mut call_record = CallRecord::new(Arc::clone(&record));
        call_record.responses.push(Arc::clone(&record));
        assert!(replay_call(&call_record).unwrap().starts_with("luna-send -n 1 "));

        call_record.responses.push(Arc::clone(&record));
        assert!(replay_call(&call_record).unwrap().starts_with("luna-send -i "));
    }

    #[test]
    fn test_replay_keeps_traced_key_order() {
        let mut record = call(Some("/m"));
        record.body = serde_json::from_str(r#"{"zeta":1,"alpha":2.0}"#).unwrap();
        let cmd = replay_record(&record).unwrap();
        assert!(cmd.ends_with(r#""{\"zeta\":1,\"alpha\":2.0}""#));
    }

    #[test]
    fn test_replay_without_method() {
        let err = replay_record(&call(None)).unwrap_err();
        assert!(matches!(err, TraceError::MissingMethod));
    }
}
