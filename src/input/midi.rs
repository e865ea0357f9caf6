//! MIDI note input
//!
//! The MIDI driver is external. It is wrapped as a `MidiSource` that the
//! listener polls without blocking; each note-on becomes a trigger for
//! layer `note mod N`.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};

use crate::error::{GardenError, Result};
use crate::net::CommandSink;
use crate::protocol::Command;

/// The subset of MIDI traffic the garden cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    Other,
}

/// A non-blocking supplier of MIDI messages.
pub trait MidiSource: Send {
    /// Everything received since the last poll. Must not block.
    fn poll(&mut self) -> Result<Vec<MidiMessage>>;
}

/// Stand-in used when no MIDI port could be opened.
#[derive(Debug, Default)]
pub struct NoMidiDevice;

impl MidiSource for NoMidiDevice {
    fn poll(&mut self) -> Result<Vec<MidiMessage>> {
        Err(GardenError::DeviceUnavailable {
            device: "MIDI",
            reason: "no input port opened".to_string(),
        })
    }
}

/// Source fed through an in-process channel (virtual keyboard, tests).
#[derive(Debug)]
pub struct ChannelMidiSource {
    rx: Receiver<MidiMessage>,
}

impl ChannelMidiSource {
    pub fn new() -> (Sender<MidiMessage>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }
}

impl MidiSource for ChannelMidiSource {
    fn poll(&mut self) -> Result<Vec<MidiMessage>> {
        let mut messages = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(message) => messages.push(message),
                Err(TryRecvError::Empty) => return Ok(messages),
                Err(TryRecvError::Disconnected) if !messages.is_empty() => return Ok(messages),
                Err(TryRecvError::Disconnected) => {
                    return Err(GardenError::DeviceUnavailable {
                        device: "MIDI",
                        reason: "virtual input closed".to_string(),
                    })
                }
            }
        }
    }
}

/// Map a message to a layer trigger: note-on with velocity above zero.
pub fn trigger_for(message: MidiMessage, layers: usize) -> Option<Command> {
    match message {
        MidiMessage::NoteOn { note, velocity } if velocity > 0 && layers > 0 => {
            Some(Command::MidiTrigger {
                layer: (note as usize % layers) as i64,
            })
        }
        _ => None,
    }
}

/// Polls a `MidiSource` and submits layer triggers.
pub struct MidiListener {
    source: Box<dyn MidiSource>,
    layers: usize,
    poll_interval: Duration,
    unavailable: bool,
}

impl MidiListener {
    pub fn new(source: Box<dyn MidiSource>, layers: usize, poll_interval: Duration) -> Self {
        Self {
            source,
            layers,
            poll_interval,
            unavailable: false,
        }
    }

    /// Poll once and submit any triggers. Returns how many were submitted.
    ///
    /// A failing source is reported once and then treated as silent.
    pub fn poll_once(&mut self, sink: &dyn CommandSink) -> usize {
        let messages = match self.source.poll() {
            Ok(messages) => {
                self.unavailable = false;
                messages
            }
            Err(e) => {
                if !self.unavailable {
                    warn!("MIDI input unavailable: {}", e);
                    self.unavailable = true;
                }
                return 0;
            }
        };

        let mut submitted = 0;
        for command in messages
            .into_iter()
            .filter_map(|message| trigger_for(message, self.layers))
        {
            debug!("MIDI {}", command);
            sink.submit(command);
            submitted += 1;
        }
        submitted
    }

    /// Poll forever on a background thread.
    pub fn spawn(mut self, sink: Arc<dyn CommandSink>) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("garden-midi".to_string())
            .spawn(move || loop {
                self.poll_once(sink.as_ref());
                thread::sleep(self.poll_interval);
            })?;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::CommandQueue;

    #[test]
    fn test_trigger_mapping() {
        assert_eq!(
            trigger_for(MidiMessage::NoteOn { note: 60, velocity: 90 }, 17),
            Some(Command::MidiTrigger { layer: 9 })
        );
        assert_eq!(
            trigger_for(MidiMessage::NoteOn { note: 60, velocity: 0 }, 17),
            None
        );
        assert_eq!(
            trigger_for(MidiMessage::NoteOff { note: 60, velocity: 40 }, 17),
            None
        );
        assert_eq!(trigger_for(MidiMessage::Other, 17), None);
    }

    #[test]
    fn test_listener_submits_triggers() {
        let (tx, source) = ChannelMidiSource::new();
        let mut listener = MidiListener::new(Box::new(source), 5, Duration::from_millis(1));
        let queue = CommandQueue::new();

        tx.send(MidiMessage::NoteOn { note: 7, velocity: 100 }).unwrap();
        tx.send(MidiMessage::NoteOff { note: 7, velocity: 0 }).unwrap();
        tx.send(MidiMessage::NoteOn { note: 10, velocity: 1 }).unwrap();

        assert_eq!(listener.poll_once(&queue), 2);
        assert_eq!(
            queue.drain(),
            vec![
                Command::MidiTrigger { layer: 2 },
                Command::MidiTrigger { layer: 0 }
            ]
        );
        assert_eq!(listener.poll_once(&queue), 0);
    }

    #[test]
    fn test_missing_device_degrades_to_silence() {
        let mut listener = MidiListener::new(Box::new(NoMidiDevice), 5, Duration::from_millis(1));
        let queue = CommandQueue::new();
        assert_eq!(listener.poll_once(&queue), 0);
        assert_eq!(listener.poll_once(&queue), 0);
        assert!(listener.unavailable);
        assert!(queue.is_empty());
    }
}
