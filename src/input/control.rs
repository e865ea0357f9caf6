//! Local control surface
//!
//! Panel events (sliders, toggles, collapse buttons) become commands that
//! go through the same dispatch path as everything else. The binary also
//! reads the same events from typed console lines.

use std::sync::Arc;

use log::debug;

use crate::engine::{PerformanceParams, SharedParams};
use crate::error::{GardenError, Result};
use crate::net::CommandSink;
use crate::protocol::{Adjustment, Command};

/// One interaction with the control panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    /// Bloom intensity slider moved (0.1 to 1.0)
    BloomSlider(f64),
    /// Glitch speed slider moved (0.01 to 0.2)
    GlitchSlider(f64),
    ToggleAudioReactive,
    ToggleNeonGlow,
    /// Collapse button for one layer
    Collapse(usize),
    CollapseAll,
}

impl ControlEvent {
    /// Commands this event produces given the current parameter values.
    ///
    /// Toggles flip the current value; collapse-all yields one collapse per layer.
    pub fn to_commands(&self, params: &PerformanceParams, layers: usize) -> Vec<Command> {
        match *self {
            ControlEvent::BloomSlider(value) => {
                vec![Command::Adjust(Adjustment::BloomIntensity(value))]
            }
            ControlEvent::GlitchSlider(value) => {
                vec![Command::Adjust(Adjustment::GlitchSpeed(value))]
            }
            ControlEvent::ToggleAudioReactive => vec![Command::Adjust(
                Adjustment::AudioReactive(!params.audio_reactive),
            )],
            ControlEvent::ToggleNeonGlow => {
                vec![Command::Adjust(Adjustment::NeonGlow(!params.neon_glow))]
            }
            ControlEvent::Collapse(layer) => vec![Command::Collapse {
                layer: layer as i64,
            }],
            ControlEvent::CollapseAll => (0..layers)
                .map(|layer| Command::Collapse {
                    layer: layer as i64,
                })
                .collect(),
        }
    }
}

/// Turns control events into dispatched commands.
#[derive(Clone)]
pub struct ControlSurface {
    sink: Arc<dyn CommandSink>,
    params: SharedParams,
    layers: usize,
}

impl ControlSurface {
    pub fn new(sink: Arc<dyn CommandSink>, params: SharedParams, layers: usize) -> Self {
        Self {
            sink,
            params,
            layers,
        }
    }

    /// Submit the commands for one event. Returns how many were submitted.
    ///
    /// Adjustments also take effect in the shared parameters at once, so a
    /// second toggle before the next tick flips the value the first one set.
    /// The queued copy sets the same value again when drained.
    pub fn handle(&self, event: ControlEvent) -> usize {
        let commands = event.to_commands(&self.params.snapshot(), self.layers);
        let count = commands.len();
        for command in commands {
            debug!("Control {}", command);
            if let Command::Adjust(adjustment) = &command {
                self.params.apply(adjustment);
            }
            self.sink.submit(command);
        }
        count
    }
}

// ============================================================================
// Console Input
// ============================================================================

/// A parsed console line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleInput {
    Control(ControlEvent),
    /// Play a note through the virtual MIDI keyboard
    Note { note: u8, velocity: u8 },
    Status,
    Help,
    Quit,
}

/// Console usage text
pub const CONSOLE_HELP: &str = "\
commands:
  bloom <0.1..1.0>       set bloom intensity
  glitch <0.01..0.2>     set glitch speed
  audio                  toggle audio reactivity
  neon                   toggle neon glow
  collapse <layer|all>   collapse one layer or all of them
  note <0..127> [vel]    play a note on the virtual keyboard
  status                 show current parameters
  quit                   leave the garden";

/// Parse one console line. Blank lines give `None`.
pub fn parse_console_line(line: &str) -> Result<Option<ConsoleInput>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    let invalid = || GardenError::InvalidControl {
        input: line.trim().to_string(),
    };

    let input = match (verb.to_ascii_lowercase().as_str(), arg) {
        ("bloom", Some(value)) => ConsoleInput::Control(ControlEvent::BloomSlider(
            value.parse().map_err(|_| invalid())?,
        )),
        ("glitch", Some(value)) => ConsoleInput::Control(ControlEvent::GlitchSlider(
            value.parse().map_err(|_| invalid())?,
        )),
        ("audio", None) => ConsoleInput::Control(ControlEvent::ToggleAudioReactive),
        ("neon", None) => ConsoleInput::Control(ControlEvent::ToggleNeonGlow),
        ("collapse", Some("all")) => ConsoleInput::Control(ControlEvent::CollapseAll),
        ("collapse", Some(layer)) => ConsoleInput::Control(ControlEvent::Collapse(
            layer.parse().map_err(|_| invalid())?,
        )),
        ("note", Some(note)) => {
            let note: u8 = note.parse().map_err(|_| invalid())?;
            let velocity: u8 = match words.next() {
                Some(v) => v.parse().map_err(|_| invalid())?,
                None => 100,
            };
            if note > 127 || velocity > 127 {
                return Err(invalid());
            }
            ConsoleInput::Note { note, velocity }
        }
        ("status", None) => ConsoleInput::Status,
        ("help" | "?", None) => ConsoleInput::Help,
        ("quit" | "exit", None) => ConsoleInput::Quit,
        _ => return Err(invalid()),
    };
    Ok(Some(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::CommandQueue;
    use test_case::test_case;

    #[test_case("bloom 0.7", ConsoleInput::Control(ControlEvent::BloomSlider(0.7)) ; "bloom")]
    #[test_case("GLITCH 0.1", ConsoleInput::Control(ControlEvent::GlitchSlider(0.1)) ; "glitch uppercase")]
    #[test_case("audio", ConsoleInput::Control(ControlEvent::ToggleAudioReactive) ; "audio")]
    #[test_case("neon", ConsoleInput::Control(ControlEvent::ToggleNeonGlow) ; "neon")]
    #[test_case("collapse 3", ConsoleInput::Control(ControlEvent::Collapse(3)) ; "collapse one")]
    #[test_case("collapse all", ConsoleInput::Control(ControlEvent::CollapseAll) ; "collapse all")]
    #[test_case("note 60", ConsoleInput::Note { note: 60, velocity: 100 } ; "note default velocity")]
    #[test_case("  note 61 20 ", ConsoleInput::Note { note: 61, velocity: 20 } ; "note velocity")]
    #[test_case("status", ConsoleInput::Status ; "status")]
    #[test_case("quit", ConsoleInput::Quit ; "quit")]
    fn test_parse_console_line(line: &str, expected: ConsoleInput) {
        assert_eq!(parse_console_line(line).unwrap(), Some(expected));
    }

    #[test_case("bloom" ; "missing value")]
    #[test_case("bloom loud" ; "not a number")]
    #[test_case("collapse -1" ; "negative layer")]
    #[test_case("note 200" ; "note out of range")]
    #[test_case("dance" ; "unknown verb")]
    fn test_parse_console_line_rejects(line: &str) {
        let err = parse_console_line(line).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONTROL");
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_console_line("   ").unwrap(), None);
    }

    #[test]
    fn test_toggle_flips_current_value() {
        let mut params = PerformanceParams::default();
        params.neon_glow = false;
        assert_eq!(
            ControlEvent::ToggleNeonGlow.to_commands(&params, 5),
            vec![Command::Adjust(Adjustment::NeonGlow(true))]
        );
    }

    #[test]
    fn test_collapse_all_covers_every_layer() {
        let commands = ControlEvent::CollapseAll.to_commands(&PerformanceParams::default(), 4);
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[3], Command::Collapse { layer: 3 });
    }

    #[test]
    fn test_surface_submits_to_sink() {
        let queue = Arc::new(CommandQueue::new());
        let surface = ControlSurface::new(queue.clone(), SharedParams::default(), 3);
        assert_eq!(surface.handle(ControlEvent::ToggleAudioReactive), 1);
        assert_eq!(
            queue.drain(),
            vec![Command::Adjust(Adjustment::AudioReactive(false))]
        );
    }

    #[test]
    fn test_repeated_toggles_alternate_before_tick() {
        let queue = Arc::new(CommandQueue::new());
        let params = SharedParams::default();
        let surface = ControlSurface::new(queue.clone(), params.clone(), 3);

        surface.handle(ControlEvent::ToggleNeonGlow);
        assert!(!params.snapshot().neon_glow);
        surface.handle(ControlEvent::ToggleNeonGlow);
        assert!(params.snapshot().neon_glow);

        assert_eq!(
            queue.drain(),
            vec![
                Command::Adjust(Adjustment::NeonGlow(false)),
                Command::Adjust(Adjustment::NeonGlow(true))
            ]
        );
    }
}
