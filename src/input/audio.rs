//! Audio loudness input
//!
//! The audio driver itself lives outside the crate. It hands each captured
//! block to an `AudioMeter`, which publishes a loudness level the engine
//! reads once per tick. With no device attached the level simply stays 0.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::engine::SharedParams;

/// Latest loudness sample, shared between the audio callback and the engine.
#[derive(Debug, Clone, Default)]
pub struct AudioLevel {
    bits: Arc<AtomicU32>,
}

impl AudioLevel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent level (0 until a block has been measured)
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Publish a level; negative and non-finite values are stored as 0.
    pub fn set(&self, level: f32) {
        let level = if level.is_finite() { level.max(0.0) } else { 0.0 };
        self.bits.store(level.to_bits(), Ordering::Relaxed);
    }
}

/// Converts raw sample blocks into the shared loudness level.
#[derive(Debug, Clone)]
pub struct AudioMeter {
    level: AudioLevel,
    params: SharedParams,
}

impl AudioMeter {
    pub fn new(level: AudioLevel, params: SharedParams) -> Self {
        Self { level, params }
    }

    /// Measure one captured block.
    ///
    /// The level is the Euclidean norm of the block. While audio reactivity
    /// is switched off the previous level is left frozen.
    pub fn feed(&self, block: &[f32]) {
        if !self.params.snapshot().audio_reactive {
            return;
        }
        self.level.set(loudness(block));
    }

    pub fn level(&self) -> &AudioLevel {
        &self.level
    }
}

/// Euclidean (L2) norm of a block of samples
pub fn loudness(block: &[f32]) -> f32 {
    block.iter().map(|s| s * s).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Adjustment;
    use approx::assert_relative_eq;

    #[test]
    fn test_loudness_is_l2_norm() {
        assert_relative_eq!(loudness(&[3.0, 4.0]), 5.0);
        assert_eq!(loudness(&[]), 0.0);
    }

    #[test]
    fn test_level_sanitised() {
        let level = AudioLevel::new();
        level.set(f32::NAN);
        assert_eq!(level.get(), 0.0);
        level.set(-1.0);
        assert_eq!(level.get(), 0.0);
        level.set(0.25);
        assert_eq!(level.get(), 0.25);
    }

    #[test]
    fn test_meter_frozen_when_not_reactive() {
        let params = SharedParams::default();
        let meter = AudioMeter::new(AudioLevel::new(), params.clone());

        meter.feed(&[0.6, 0.8]);
        assert_relative_eq!(meter.level().get(), 1.0);

        params.apply(&Adjustment::AudioReactive(false));
        meter.feed(&[0.0, 0.0]);
        assert_relative_eq!(meter.level().get(), 1.0);
    }
}
