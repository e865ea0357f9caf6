//! Evolution Engine
//!
//! Advances the garden by one animation tick:
//! 1. drain the inbound command queue and apply each command in order
//! 2. run the physics step over every layer
//!
//! Per layer `i` the physics step is:
//!
//! ```text
//! glitch       = noise * 0.1 * glitch_speed * audio_factor
//! intensity[i] = clamp01(intensity[i] + glitch + attention[i] * 0.3)
//! attention[i] *= 0.95
//! ghost[i]     = clamp01(ghost[i] * 0.95 + intensity[i] * 0.05)
//! intensity[i-1], intensity[i+1] += ghost[i] * 0.03     (unclamped)
//! if a bloom is queued: intensity[i] += noise * bloom_intensity (unclamped)
//! ```
//!
//! The neighbour leak and the bloom are not clamped. Any overshoot shows
//! for one frame and is folded back by the next tick's clamp.

use std::sync::Arc;

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::params::SharedParams;
use super::render::Frame;
use crate::config::GardenConfig;
use crate::input::AudioLevel;
use crate::layers::{Layer, LayerStore};
use crate::net::CommandQueue;
use crate::protocol::Command;

// ============================================================================
// Constants
// ============================================================================

/// Base glitch amplitude before `glitch_speed` scaling
const GLITCH_SCALE: f32 = 0.1;

/// Glitch gain per unit of audio level when audio reactive
const AUDIO_GAIN: f32 = 3.0;

/// Intensity boost per unit of observer attention
const ATTENTION_GAIN: f32 = 0.3;

/// Per-tick observer attention decay
const ATTENTION_DECAY: f32 = 0.95;

/// Memory ghost decay per tick
const GHOST_DECAY: f32 = 0.95;

/// Share of current intensity blended into the ghost
const GHOST_GAIN: f32 = 0.05;

/// Share of a layer's ghost leaked into each neighbour
const DIFFUSION_LEAK: f32 = 0.03;

/// Summary of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Tick number just completed (1-based)
    pub tick: u64,
    /// Commands drained and applied this tick
    pub applied: usize,
    /// Blooms consumed this tick
    pub blooms: usize,
}

/// Owns the layer store and evolves it once per tick.
pub struct EvolutionEngine {
    store: LayerStore,
    params: SharedParams,
    queue: Arc<CommandQueue>,
    audio: AudioLevel,
    depth_falloff: f32,
    rng: StdRng,
    ticks: u64,
}

impl EvolutionEngine {
    /// Create an engine with entropy-seeded noise.
    pub fn new(
        config: &GardenConfig,
        params: SharedParams,
        queue: Arc<CommandQueue>,
        audio: AudioLevel,
    ) -> Self {
        Self::with_rng(config, params, queue, audio, StdRng::from_entropy())
    }

    /// Create an engine with a caller-supplied generator (reproducible runs).
    pub fn with_rng(
        config: &GardenConfig,
        params: SharedParams,
        queue: Arc<CommandQueue>,
        audio: AudioLevel,
        mut rng: StdRng,
    ) -> Self {
        let store = LayerStore::new(
            config.layers,
            config.grid_size,
            config.initial_intensity,
            &mut rng,
        );
        Self {
            store,
            params,
            queue,
            audio,
            depth_falloff: config.depth_falloff,
            rng,
            ticks: 0,
        }
    }

    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut LayerStore {
        &mut self.store
    }

    pub fn params(&self) -> &SharedParams {
        &self.params
    }

    pub fn queue(&self) -> &Arc<CommandQueue> {
        &self.queue
    }

    /// Ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one full tick: drain commands, then the physics step.
    pub fn tick(&mut self) -> TickReport {
        let applied = self.apply_pending();
        let blooms = self.step();
        self.ticks += 1;
        let report = TickReport {
            tick: self.ticks,
            applied,
            blooms,
        };
        trace!("{:?}", report);
        report
    }

    /// Drain the inbound queue and apply every command, in arrival order.
    pub fn apply_pending(&mut self) -> usize {
        let commands = self.queue.drain();
        for command in &commands {
            self.apply(command);
        }
        commands.len()
    }

    /// Apply one command to the parameters or the store.
    pub fn apply(&mut self, command: &Command) {
        match command {
            Command::Adjust(adjustment) => {
                debug!("Applying {}", command);
                self.params.apply(adjustment);
            }
            Command::Collapse { layer } => {
                self.store.collapse(*layer, &mut self.rng);
            }
            Command::MidiTrigger { layer } => {
                let index = self.store.normalize_index(*layer);
                if let Some(target) = self.store.get_mut(index) {
                    target.queue_bloom();
                }
            }
        }
    }

    /// The physics step alone. Returns the number of blooms consumed.
    pub fn step(&mut self) -> usize {
        let params = self.params.snapshot();
        let audio_factor = if params.audio_reactive {
            1.0 + AUDIO_GAIN * self.audio.get()
        } else {
            1.0
        };
        let glitch_scale = GLITCH_SCALE * params.glitch_speed as f32 * audio_factor;
        let bloom_scale = params.bloom_intensity as f32;

        let rng = &mut self.rng;
        let layers = self.store.layers_mut();
        let mut blooms = 0;

        for i in 0..layers.len() {
            let (before, rest) = layers.split_at_mut(i);
            let Some((layer, after)) = rest.split_first_mut() else {
                break;
            };

            let attention = layer.observer_attention() * ATTENTION_GAIN;
            let intensity = layer.intensity_mut();
            intensity.add_noise(glitch_scale, rng);
            intensity.add_scalar(attention);
            intensity.clamp01();
            layer.decay_attention(ATTENTION_DECAY);

            layer.blend_into_ghost(GHOST_DECAY, GHOST_GAIN);
            leak(layer, before.last_mut());
            leak(layer, after.first_mut());

            if layer.take_bloom() {
                layer.intensity_mut().add_noise(bloom_scale, rng);
                blooms += 1;
            }
        }

        blooms
    }

    /// Render-ready view of the current state
    pub fn frame(&mut self) -> Frame {
        let neon_glow = self.params.snapshot().neon_glow;
        Frame::build(
            &self.store,
            self.ticks,
            neon_glow,
            self.depth_falloff,
            &mut self.rng,
        )
    }
}

fn leak(source: &Layer, neighbour: Option<&mut Layer>) {
    if let Some(neighbour) = neighbour {
        neighbour
            .intensity_mut()
            .add_scaled(source.memory_ghost(), DIFFUSION_LEAK);
    }
}
