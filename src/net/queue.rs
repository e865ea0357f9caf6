//! Inbound command queue
//!
//! Every worker that produces commands (connection readers, controls, the
//! MIDI listener) appends here; the evolution engine drains it once per
//! tick. A drain takes the whole backlog under the lock, so a command
//! pushed concurrently lands either in this drain or the next, never both.

use parking_lot::Mutex;

use crate::protocol::Command;

/// Multi-producer FIFO with an atomic drain.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Mutex<Vec<Command>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one command
    pub fn push(&self, command: Command) {
        self.commands.lock().push(command);
    }

    /// Append several commands, preserving their order
    pub fn extend(&self, commands: impl IntoIterator<Item = Command>) {
        self.commands.lock().extend(commands);
    }

    /// Take everything queued so far, in arrival order
    pub fn drain(&self) -> Vec<Command> {
        std::mem::take(&mut *self.commands.lock())
    }

    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.lock().is_empty()
    }
}
