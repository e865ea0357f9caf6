//! Stream reassembly for unframed command records
//!
//! Commands are written back to back with no length prefix or delimiter,
//! so a single read may hold half a record, several records, or both. The
//! decoder buffers bytes until complete JSON values can be pulled out.

use log::debug;
use serde_json::Value;

use super::command::Command;

/// Upper bound on buffered bytes awaiting a complete record
pub const MAX_PENDING_BYTES: usize = 64 * 1024;

/// Incremental decoder for one connection's byte stream.
#[derive(Debug, Default)]
pub struct CommandDecoder {
    pending: Vec<u8>,
    dropped: u64,
}

impl CommandDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every command completed by it.
    ///
    /// Malformed records are dropped; an incomplete trailing record is kept
    /// for the next call. After a hard syntax error decoding resumes at the
    /// next `{`, so only the damaged record is lost.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Command> {
        self.pending.extend_from_slice(chunk);

        let mut commands = Vec::new();
        let mut consumed = 0;
        while consumed < self.pending.len() {
            let base = consumed;
            let mut stream =
                serde_json::Deserializer::from_slice(&self.pending[base..]).into_iter::<Value>();
            let damaged = loop {
                match stream.next() {
                    Some(Ok(value)) => {
                        consumed = base + stream.byte_offset();
                        match Command::from_value(value) {
                            Ok(command) => commands.push(command),
                            Err(e) => {
                                debug!("Dropping command record: {}", e);
                                self.dropped += 1;
                            }
                        }
                    }
                    Some(Err(e)) if e.is_eof() => break false,
                    Some(Err(e)) => {
                        debug!("Skipping undecodable stream data: {}", e);
                        break true;
                    }
                    None => {
                        consumed = base + stream.byte_offset();
                        break false;
                    }
                }
            };
            if !damaged {
                break;
            }
            self.dropped += 1;
            consumed = next_record_start(&self.pending, consumed + 1);
        }

        self.pending.drain(..consumed);
        if self.pending.len() > MAX_PENDING_BYTES {
            debug!(
                "Discarding {} buffered bytes without a complete record",
                self.pending.len()
            );
            self.pending.clear();
            self.dropped += 1;
        }
        commands
    }

    /// Bytes held back waiting for the rest of a record
    pub fn pending_bytes(&self) -> usize {
        self.pending.len()
    }

    /// Records or buffers dropped so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Offset of the first `{` at or after `from`, or the buffer length.
fn next_record_start(buf: &[u8], from: usize) -> usize {
    buf.get(from..)
        .and_then(|rest| rest.iter().position(|&b| b == b'{'))
        .map_or(buf.len(), |offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Adjustment;

    #[test]
    fn test_single_record() {
        let mut decoder = CommandDecoder::new();
        let commands = decoder.feed(br#"{"type":"collapse","layer":2}"#);
        assert_eq!(commands, vec![Command::Collapse { layer: 2 }]);
        assert_eq!(decoder.pending_bytes(), 0);
    }

    #[test]
    fn test_concatenated_records() {
        let mut decoder = CommandDecoder::new();
        let commands =
            decoder.feed(br#"{"type":"midi","layer":1}{"type":"adjust","param":"neon_glow","value":false}"#);
        assert_eq!(
            commands,
            vec![
                Command::MidiTrigger { layer: 1 },
                Command::Adjust(Adjustment::NeonGlow(false)),
            ]
        );
    }

    #[test]
    fn test_split_record() {
        let mut decoder = CommandDecoder::new();
        assert!(decoder.feed(br#"{"type":"adjust","par"#).is_empty());
        assert!(decoder.pending_bytes() > 0);

        let commands = decoder.feed(br#"am":"bloom","value":0.7}{"type":"mi"#);
        assert_eq!(commands, vec![Command::Adjust(Adjustment::BloomIntensity(0.7))]);

        let commands = decoder.feed(br#"di","layer":3}"#);
        assert_eq!(commands, vec![Command::MidiTrigger { layer: 3 }]);
        assert_eq!(decoder.pending_bytes(), 0);
    }

    #[test]
    fn test_invalid_record_dropped_stream_continues() {
        let mut decoder = CommandDecoder::new();
        let commands = decoder.feed(
            br#"{"type":"adjust","param":"volume","value":1}{"type":"collapse","layer":4}"#,
        );
        assert_eq!(commands, vec![Command::Collapse { layer: 4 }]);
        assert_eq!(decoder.dropped(), 1);
    }

    #[test]
    fn test_garbage_resynchronises() {
        let mut decoder = CommandDecoder::new();
        assert!(decoder.feed(b"}}not json").is_empty());
        assert_eq!(decoder.pending_bytes(), 0);

        let commands = decoder.feed(br#"{"type":"collapse","layer":0}"#);
        assert_eq!(commands, vec![Command::Collapse { layer: 0 }]);
    }

    #[test]
    fn test_garbage_prefix_keeps_following_records() {
        let mut decoder = CommandDecoder::new();
        let commands =
            decoder.feed(br#"oops{"type":"collapse","layer":1}{"type":"midi","layer":2}"#);
        assert_eq!(
            commands,
            vec![
                Command::Collapse { layer: 1 },
                Command::MidiTrigger { layer: 2 }
            ]
        );
        assert_eq!(decoder.dropped(), 1);
        assert_eq!(decoder.pending_bytes(), 0);
    }

    #[test]
    fn test_damaged_record_does_not_poison_next_chunk() {
        let mut decoder = CommandDecoder::new();
        let first = decoder.feed(br#"{"type":"collapse","layer":1]{"type":"mi"#);
        assert!(first.is_empty());
        assert_eq!(decoder.dropped(), 1);

        let second = decoder.feed(br#"di","layer":3}{"type":"collapse","layer":4}"#);
        assert_eq!(
            second,
            vec![
                Command::MidiTrigger { layer: 3 },
                Command::Collapse { layer: 4 }
            ]
        );
        assert_eq!(decoder.pending_bytes(), 0);
    }

    #[test]
    fn test_oversized_partial_discarded() {
        let mut decoder = CommandDecoder::new();
        let mut chunk = br#"{"type":"adjust","param":""#.to_vec();
        chunk.extend(std::iter::repeat(b'a').take(MAX_PENDING_BYTES));
        assert!(decoder.feed(&chunk).is_empty());
        assert_eq!(decoder.pending_bytes(), 0);
    }
}
