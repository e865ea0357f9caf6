//! A single depth layer of the garden
//!
//! A layer owns its visible intensity grid, a trailing "memory ghost" of
//! that intensity, a decaying observer attention scalar, and the count of
//! MIDI blooms waiting to be applied.

use rand::Rng;

use super::grid::Grid;

/// One depth slice of the visualization.
///
/// The index and grid shape are fixed for the lifetime of the layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    index: usize,
    intensity: Grid,
    memory_ghost: Grid,
    observer_attention: f32,
    pending_blooms: u32,
}

impl Layer {
    /// Create a layer seeded with uniform noise in `[0, initial_scale)`
    /// and an empty memory ghost.
    pub fn seeded<R: Rng + ?Sized>(
        index: usize,
        grid_size: usize,
        initial_scale: f32,
        rng: &mut R,
    ) -> Self {
        Self {
            index,
            intensity: Grid::noise(grid_size, initial_scale, rng),
            memory_ghost: Grid::zeros(grid_size),
            observer_attention: 0.0,
            pending_blooms: 0,
        }
    }

    /// Create the fresh state a collapse leaves behind: full-range noise,
    /// no ghost, no attention.
    pub fn collapsed<R: Rng + ?Sized>(index: usize, grid_size: usize, rng: &mut R) -> Self {
        Self::seeded(index, grid_size, 1.0, rng)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn grid_size(&self) -> usize {
        self.intensity.size()
    }

    pub fn intensity(&self) -> &Grid {
        &self.intensity
    }

    pub fn intensity_mut(&mut self) -> &mut Grid {
        &mut self.intensity
    }

    pub fn memory_ghost(&self) -> &Grid {
        &self.memory_ghost
    }

    pub fn memory_ghost_mut(&mut self) -> &mut Grid {
        &mut self.memory_ghost
    }

    /// `ghost = clamp01(ghost * decay + intensity * gain)`
    pub fn blend_into_ghost(&mut self, decay: f32, gain: f32) {
        self.memory_ghost.scale(decay);
        self.memory_ghost.add_scaled(&self.intensity, gain);
        self.memory_ghost.clamp01();
    }

    pub fn observer_attention(&self) -> f32 {
        self.observer_attention
    }

    /// Raise observer attention; negative amounts are ignored.
    pub fn attend(&mut self, amount: f32) {
        if amount > 0.0 {
            self.observer_attention += amount;
        }
    }

    /// Geometric decay toward zero
    pub fn decay_attention(&mut self, factor: f32) {
        self.observer_attention *= factor;
    }

    pub fn pending_blooms(&self) -> u32 {
        self.pending_blooms
    }

    /// Queue a bloom for the next tick
    pub fn queue_bloom(&mut self) {
        self.pending_blooms = self.pending_blooms.saturating_add(1);
    }

    /// Consume one queued bloom, returning whether there was one
    pub fn take_bloom(&mut self) -> bool {
        if self.pending_blooms == 0 {
            return false;
        }
        self.pending_blooms -= 1;
        true
    }

    pub(crate) fn set_pending_blooms(&mut self, count: u32) {
        self.pending_blooms = count;
    }
}
