//! Global performance parameters
//!
//! One record shared by the engine, the controls and the render boundary.
//! It only changes through `Adjustment`s, whether they come from a local
//! slider or from a peer.

use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::protocol::{Adjustment, ParamKind};

/// Current values of the adjustable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceParams {
    /// Scale of the noise a MIDI bloom adds, within `0.1..=1.0`
    pub bloom_intensity: f64,
    /// Scale of the per-tick glitch, within `0.01..=0.2`
    pub glitch_speed: f64,
    /// Whether audio loudness amplifies the glitch
    pub audio_reactive: bool,
    /// Whether overlays flicker
    pub neon_glow: bool,
}

impl Default for PerformanceParams {
    fn default() -> Self {
        Self {
            bloom_intensity: 0.5,
            glitch_speed: 0.05,
            audio_reactive: true,
            neon_glow: true,
        }
    }
}

impl PerformanceParams {
    /// Apply a change, clamping float values into the parameter's range.
    pub fn apply(&mut self, adjustment: &Adjustment) {
        match *adjustment {
            Adjustment::BloomIntensity(value) => {
                self.bloom_intensity = clamp_to(ParamKind::BloomIntensity, value)
            }
            Adjustment::GlitchSpeed(value) => {
                self.glitch_speed = clamp_to(ParamKind::GlitchSpeed, value)
            }
            Adjustment::AudioReactive(flag) => self.audio_reactive = flag,
            Adjustment::NeonGlow(flag) => self.neon_glow = flag,
        }
    }

    /// The current value of `kind`, as an adjustment that would restore it
    pub fn current(&self, kind: ParamKind) -> Adjustment {
        match kind {
            ParamKind::BloomIntensity => Adjustment::BloomIntensity(self.bloom_intensity),
            ParamKind::GlitchSpeed => Adjustment::GlitchSpeed(self.glitch_speed),
            ParamKind::AudioReactive => Adjustment::AudioReactive(self.audio_reactive),
            ParamKind::NeonGlow => Adjustment::NeonGlow(self.neon_glow),
        }
    }
}

fn clamp_to(kind: ParamKind, value: f64) -> f64 {
    match kind.range() {
        Some((min, max)) => {
            let clamped = value.clamp(min, max);
            if clamped != value {
                debug!("Clamped {} from {} to {}", kind, value, clamped);
            }
            clamped
        }
        None => value,
    }
}

/// Process-wide handle to the performance parameters.
#[derive(Debug, Clone, Default)]
pub struct SharedParams {
    inner: Arc<RwLock<PerformanceParams>>,
}

impl SharedParams {
    pub fn new(params: PerformanceParams) -> Self {
        Self {
            inner: Arc::new(RwLock::new(params)),
        }
    }

    /// Copy of the current values
    pub fn snapshot(&self) -> PerformanceParams {
        *self.inner.read()
    }

    pub fn apply(&self, adjustment: &Adjustment) {
        self.inner.write().apply(adjustment);
    }
}
