//! Input Sources Module
//!
//! Boundaries to the external audio driver, MIDI driver and control panel.
//! Each turns raw input into commands or levels the engine consumes.

pub mod audio;
pub mod control;
pub mod midi;

pub use audio::{loudness, AudioLevel, AudioMeter};
pub use control::{parse_console_line, ConsoleInput, ControlEvent, ControlSurface, CONSOLE_HELP};
pub use midi::{trigger_for, ChannelMidiSource, MidiListener, MidiMessage, MidiSource, NoMidiDevice};
