//! Command vocabulary
//!
//! Every change to shared garden state travels as a `Command`, whether it
//! came from this process's controls or from a peer. On the wire a command
//! is one compact JSON object with a `type` discriminator:
//!
//! ```text
//! {"type":"adjust","param":"bloom","value":0.7}
//! {"type":"collapse","layer":2}
//! {"type":"midi","layer":4}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GardenError, Result};

// ============================================================================
// Adjustable Parameters
// ============================================================================

/// The closed set of global performance parameters a peer may adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    BloomIntensity,
    GlitchSpeed,
    AudioReactive,
    NeonGlow,
}

impl ParamKind {
    pub const ALL: [ParamKind; 4] = [
        ParamKind::BloomIntensity,
        ParamKind::GlitchSpeed,
        ParamKind::AudioReactive,
        ParamKind::NeonGlow,
    ];

    /// Name emitted on the wire
    pub fn wire_name(&self) -> &'static str {
        match self {
            ParamKind::BloomIntensity => "bloom",
            ParamKind::GlitchSpeed => "glitch",
            ParamKind::AudioReactive => "audio_reactive",
            ParamKind::NeonGlow => "neon_glow",
        }
    }

    /// Resolve a wire name, accepting the long and camelCase spellings.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "bloom" | "bloom_intensity" | "bloomIntensity" => Ok(ParamKind::BloomIntensity),
            "glitch" | "glitch_speed" | "glitchSpeed" => Ok(ParamKind::GlitchSpeed),
            "audio_reactive" | "audioReactive" => Ok(ParamKind::AudioReactive),
            "neon_glow" | "neonGlow" => Ok(ParamKind::NeonGlow),
            other => Err(GardenError::UnknownParameter {
                name: other.to_string(),
            }),
        }
    }

    /// Valid range for float parameters
    pub fn range(&self) -> Option<(f64, f64)> {
        match self {
            ParamKind::BloomIntensity => Some((0.1, 1.0)),
            ParamKind::GlitchSpeed => Some((0.01, 0.2)),
            ParamKind::AudioReactive | ParamKind::NeonGlow => None,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A typed parameter change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    BloomIntensity(f64),
    GlitchSpeed(f64),
    AudioReactive(bool),
    NeonGlow(bool),
}

impl Adjustment {
    pub fn param(&self) -> ParamKind {
        match self {
            Adjustment::BloomIntensity(_) => ParamKind::BloomIntensity,
            Adjustment::GlitchSpeed(_) => ParamKind::GlitchSpeed,
            Adjustment::AudioReactive(_) => ParamKind::AudioReactive,
            Adjustment::NeonGlow(_) => ParamKind::NeonGlow,
        }
    }

    /// Validate a wire `(param, value)` pair against the parameter's type.
    pub fn from_wire(param: &str, value: &Value) -> Result<Self> {
        let kind = ParamKind::from_name(param)?;
        match kind {
            ParamKind::BloomIntensity | ParamKind::GlitchSpeed => {
                let number = value
                    .as_f64()
                    .filter(|v| v.is_finite())
                    .ok_or(GardenError::InvalidParameterValue {
                        param: kind.wire_name(),
                        expected: "a finite number",
                    })?;
                Ok(match kind {
                    ParamKind::BloomIntensity => Adjustment::BloomIntensity(number),
                    _ => Adjustment::GlitchSpeed(number),
                })
            }
            ParamKind::AudioReactive | ParamKind::NeonGlow => {
                let flag = value.as_bool().ok_or(GardenError::InvalidParameterValue {
                    param: kind.wire_name(),
                    expected: "a boolean",
                })?;
                Ok(match kind {
                    ParamKind::AudioReactive => Adjustment::AudioReactive(flag),
                    _ => Adjustment::NeonGlow(flag),
                })
            }
        }
    }

    fn wire_value(&self) -> Value {
        match *self {
            Adjustment::BloomIntensity(v) | Adjustment::GlitchSpeed(v) => Value::from(v),
            Adjustment::AudioReactive(b) | Adjustment::NeonGlow(b) => Value::Bool(b),
        }
    }
}

// ============================================================================
// Command
// ============================================================================

/// A single change to shared garden state.
///
/// Layer indices are carried as received and normalised modulo the layer
/// count when applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireCommand", into = "WireCommand")]
pub enum Command {
    Adjust(Adjustment),
    Collapse { layer: i64 },
    MidiTrigger { layer: i64 },
}

impl Command {
    /// Wire discriminator for this command
    pub fn tag(&self) -> &'static str {
        match self {
            Command::Adjust(_) => "adjust",
            Command::Collapse { .. } => "collapse",
            Command::MidiTrigger { .. } => "midi",
        }
    }

    /// Serialize to compact JSON bytes, without any framing.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode one complete record.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Convert an already-parsed JSON value, reporting unknown tags and
    /// parameters precisely.
    pub fn from_value(value: Value) -> Result<Self> {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if !matches!(tag.as_str(), "adjust" | "collapse" | "midi") {
            return Err(GardenError::UnknownCommand { tag });
        }
        let wire: WireCommand = serde_json::from_value(value)?;
        Command::try_from(wire)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Adjust(adjustment) => {
                write!(f, "adjust {}={}", adjustment.param(), adjustment.wire_value())
            }
            Command::Collapse { layer } => write!(f, "collapse {}", layer),
            Command::MidiTrigger { layer } => write!(f, "midi {}", layer),
        }
    }
}

/// Untyped wire shape; `Command` converts through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireCommand {
    Adjust { param: String, value: Value },
    Collapse { layer: i64 },
    Midi { layer: i64 },
}

impl TryFrom<WireCommand> for Command {
    type Error = GardenError;

    fn try_from(wire: WireCommand) -> Result<Self> {
        match wire {
            WireCommand::Adjust { param, value } => {
                Ok(Command::Adjust(Adjustment::from_wire(&param, &value)?))
            }
            WireCommand::Collapse { layer } => Ok(Command::Collapse { layer }),
            WireCommand::Midi { layer } => Ok(Command::MidiTrigger { layer }),
        }
    }
}

impl From<Command> for WireCommand {
    fn from(command: Command) -> Self {
        match command {
            Command::Adjust(adjustment) => WireCommand::Adjust {
                param: adjustment.param().wire_name().to_string(),
                value: adjustment.wire_value(),
            },
            Command::Collapse { layer } => WireCommand::Collapse { layer },
            Command::MidiTrigger { layer } => WireCommand::Midi { layer },
        }
    }
}
