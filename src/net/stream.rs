//! Shared read loop for command streams

use std::io::{ErrorKind, Read};

use log::debug;

use super::queue::CommandQueue;
use crate::protocol::CommandDecoder;

/// Read from `stream` until it closes, queueing every decoded command.
///
/// Returns the number of commands queued. Read errors end the loop the
/// same way a clean close does; decode errors never do.
pub(crate) fn pump_commands<R: Read>(
    mut stream: R,
    queue: &CommandQueue,
    read_chunk: usize,
) -> usize {
    let mut decoder = CommandDecoder::new();
    let mut buf = vec![0u8; read_chunk.max(1)];
    let mut received = 0;
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let commands = decoder.feed(&buf[..n]);
                received += commands.len();
                queue.extend(commands);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Stream read ended: {}", e);
                break;
            }
        }
    }
    received
}
