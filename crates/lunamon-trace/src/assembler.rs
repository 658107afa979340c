//! Incremental assembly of the monitor's text stream.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::extractor::{Extraction, RecordExtractor};
use crate::types::Record;

lazy_static! {
    static ref HEADER_RE: Regex = Regex::new(
        r"Time\tStatus\s+Prot\s+Type\s+Serial\s+Sender\s+Destination\s+Method\s+Payload\n"
    )
    .expect("invalid regex");
}

/// Whether the column-title header has been seen yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    Seeking,
    Ready,
}

/// Buffers raw chunks and drains every complete record out of them.
///
/// Chunks may be split anywhere, including inside a multi-byte UTF-8
/// sequence when fed through [`StreamAssembler::append_bytes`].
#[derive(Debug)]
pub struct StreamAssembler {
    buffer: String,
    pending: Vec<u8>,
    state: AssemblerState,
    discarded: usize,
}

impl Default for StreamAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            pending: Vec::new(),
            state: AssemblerState::Seeking,
            discarded: 0,
        }
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == AssemblerState::Ready
    }

    /// Text received but not yet turned into records.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Number of matched lines dropped because they failed to decode.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Append a text chunk and return the records it completed, oldest first.
    pub fn append(&mut self, chunk: &str) -> Vec<Record> {
        self.buffer.push_str(chunk);
        self.drain()
    }

    /// Append raw transport bytes.
    ///
    /// A trailing incomplete UTF-8 sequence is held back until the next
    /// chunk; invalid bytes become U+FFFD.
    pub fn append_bytes(&mut self, chunk: &[u8]) -> Vec<Record> {
        self.pending.extend_from_slice(chunk);
        self.decode_pending();
        self.drain()
    }

    fn decode_pending(&mut self) {
        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    // `valid_up_to` is always a char boundary
                    if let Ok(text) = std::str::from_utf8(&self.pending[start..start + valid]) {
                        self.buffer.push_str(text);
                    }
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            start += valid + len;
                        }
                        None => {
                            start += valid;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
    }

    fn drain(&mut self) -> Vec<Record> {
        let mut records = Vec::new();

        loop {
            let mut matched = false;

            if self.state == AssemblerState::Seeking {
                if let Some(header) = HEADER_RE.find(&self.buffer) {
                    if header.start() > 0 {
                        debug!(dropped = %&self.buffer[..header.start()], "Dropping data before header");
                    }
                    let end = header.end();
                    self.buffer.drain(..end);
                    self.state = AssemblerState::Ready;
                    debug!("Trace header found");
                    matched = true;
                }
            }

            if self.state == AssemblerState::Ready {
                let extraction = RecordExtractor::extract(&self.buffer);
                let consumed = extraction.consumed();

                match extraction {
                    Extraction::Incomplete => {}
                    Extraction::Record {
                        record, skipped, ..
                    } => {
                        self.log_skipped(skipped);
                        records.push(record);
                        matched = true;
                    }
                    Extraction::Discarded { error, skipped, .. } => {
                        self.log_skipped(skipped);
                        warn!(
                            error = %error,
                            line = %self.buffer[skipped..consumed].trim_end(),
                            "Discarding malformed record"
                        );
                        self.discarded += 1;
                        matched = true;
                    }
                }

                self.buffer.drain(..consumed);
            }

            if !matched {
                break;
            }
        }

        records
    }

    fn log_skipped(&self, skipped: usize) {
        if skipped > 0 {
            debug!(dropped = %&self.buffer[..skipped], "Dropping data before record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Time\tStatus   Prot  Type    Serial  Sender   Destination   Method   Payload\n";

    #[test]
    fn test_starts_seeking() {
        let assembler = StreamAssembler::new();
        assert_eq!(assembler.state(), AssemblerState::Seeking);
        assert!(!assembler.is_ready());
    }

    #[test]
    fn test_header_drops_prefix() {
        let mut assembler = StreamAssembler::new();
        let records = assembler.append(&format!("motd banner\n{}", HEADER));
        assert!(records.is_empty());
        assert!(assembler.is_ready());
        assert_eq!(assembler.buffered(), "");
    }

    #[test]
    fn test_records_before_header_are_not_extracted() {
        let mut assembler = StreamAssembler::new();
        let records = assembler.append("1.0 TX call 1 com.a (a1) com.b (b1) «{}»\n");
        assert!(records.is_empty());
        assert!(!assembler.is_ready());
        assert!(!assembler.buffered().is_empty());
    }

    #[test]
    fn test_split_multibyte_delimiter() {
        let mut assembler = StreamAssembler::new();
        assembler.append(HEADER);

        let line = "1.0 TX call 1 com.a (a1) com.b (b1) «{}»\n".as_bytes();
        // '«' is two bytes; split between them
        let split = line.iter().position(|&b| b == 0xC2).unwrap() + 1;
        assert!(assembler.append_bytes(&line[..split]).is_empty());
        let records = assembler.append_bytes(&line[split..]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].token, 1);
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let mut assembler = StreamAssembler::new();
        assembler.append_bytes(&[0xFF, b'x']);
        assert_eq!(assembler.buffered(), "\u{FFFD}x");
    }

    #[test]
    fn test_discarded_record_does_not_stall_stream() {
        let mut assembler = StreamAssembler::new();
        let input = format!(
            "{}1.0 TX call 1 com.a (a1) com.b (b1) «oops»\n2.0 TX call 2 com.a (a1) com.b (b1) «{{}}»\n",
            HEADER
        );
        let records = assembler.append(&input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].token, 2);
        assert_eq!(assembler.discarded(), 1);
        assert_eq!(assembler.buffered(), "");
    }
}
