//! Console control loop
//!
//! Reads typed commands from a line source and feeds them into the
//! control surface and the virtual MIDI keyboard.

use std::fmt;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

use log::debug;

use crate::engine::SharedParams;
use crate::input::{parse_console_line, ConsoleInput, ControlSurface, MidiMessage, CONSOLE_HELP};

/// Everything a console line can act on.
pub struct Console {
    pub surface: ControlSurface,
    pub keyboard: Sender<MidiMessage>,
    pub params: SharedParams,
}

impl Console {
    /// Process lines until input ends or `quit` is typed.
    ///
    /// `quit` also sets `stop`; end of input leaves it alone so a garden
    /// started without a terminal keeps running.
    pub fn run<R: BufRead, W: Write>(&self, input: R, output: &mut W, stop: &AtomicBool) {
        for line in input.lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_console_line(&line) {
                Ok(Some(ConsoleInput::Control(event))) => {
                    self.surface.handle(event);
                }
                Ok(Some(ConsoleInput::Note { note, velocity })) => {
                    if self
                        .keyboard
                        .send(MidiMessage::NoteOn { note, velocity })
                        .is_err()
                    {
                        debug!("Virtual keyboard listener has stopped");
                    }
                }
                Ok(Some(ConsoleInput::Status)) => {
                    let params = self.params.snapshot();
                    reply(
                        output,
                        format_args!(
                            "bloom={:.2} glitch={:.2} audio_reactive={} neon_glow={}",
                            params.bloom_intensity,
                            params.glitch_speed,
                            params.audio_reactive,
                            params.neon_glow
                        ),
                    );
                }
                Ok(Some(ConsoleInput::Help)) => {
                    reply(output, CONSOLE_HELP);
                }
                Ok(Some(ConsoleInput::Quit)) => {
                    stop.store(true, Ordering::SeqCst);
                    break;
                }
                Ok(None) => {}
                Err(e) => {
                    reply(output, format_args!("{} (type 'help')", e));
                }
            }
        }
    }
}

fn reply<W: Write>(output: &mut W, text: impl fmt::Display) {
    if let Err(e) = writeln!(output, "{}", text) {
        debug!("Console output failed: {}", e);
    }
}
