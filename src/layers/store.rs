//! Layer State Store
//!
//! Holds the per-layer simulation arrays. The store only guards per-layer
//! invariants (index and shape); cross-layer coupling is the engine's job.

use log::debug;
use rand::Rng;

use super::layer::Layer;
use crate::error::{GardenError, Result};

/// Fixed-size collection of layers indexed `0..N`.
#[derive(Debug, Clone)]
pub struct LayerStore {
    layers: Vec<Layer>,
    grid_size: usize,
}

impl LayerStore {
    /// Create `count` layers of `grid_size x grid_size` cells, each seeded
    /// with noise in `[0, initial_scale)`.
    pub fn new<R: Rng + ?Sized>(
        count: usize,
        grid_size: usize,
        initial_scale: f32,
        rng: &mut R,
    ) -> Self {
        let layers = (0..count)
            .map(|index| Layer::seeded(index, grid_size, initial_scale, rng))
            .collect();
        Self { layers, grid_size }
    }

    /// Number of layers (N)
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    /// Map any wire index onto `0..N` with Euclidean modulo.
    ///
    /// Returns 0 for an empty store.
    pub fn normalize_index(&self, index: i64) -> usize {
        if self.layers.is_empty() {
            return 0;
        }
        index.rem_euclid(self.layers.len() as i64) as usize
    }

    /// Swap in a new layer at `index`, returning the old one.
    ///
    /// The replacement must carry the same index and grid shape.
    pub fn replace(&mut self, index: usize, layer: Layer) -> Result<Layer> {
        let grid_size = self.grid_size;
        let slot = self
            .layers
            .get_mut(index)
            .ok_or_else(|| GardenError::LayerMismatch {
                index,
                reason: "no such layer".to_string(),
            })?;
        if layer.index() != index {
            return Err(GardenError::LayerMismatch {
                index,
                reason: format!("replacement carries index {}", layer.index()),
            });
        }
        if layer.grid_size() != grid_size {
            return Err(GardenError::LayerMismatch {
                index,
                reason: format!(
                    "grid size {} does not match {}",
                    layer.grid_size(),
                    grid_size
                ),
            });
        }
        Ok(std::mem::replace(slot, layer))
    }

    /// Re-randomize one layer: fresh uniform intensity, zeroed ghost and
    /// attention. Queued blooms survive the collapse.
    pub fn collapse<R: Rng + ?Sized>(&mut self, index: i64, rng: &mut R) -> usize {
        let index = self.normalize_index(index);
        let mut fresh = Layer::collapsed(index, self.grid_size, rng);
        if let Some(current) = self.layers.get(index) {
            fresh.set_pending_blooms(current.pending_blooms());
        }
        match self.replace(index, fresh) {
            Ok(_) => debug!("Collapsed layer {}", index),
            Err(e) => debug!("Collapse skipped: {}", e),
        }
        index
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Layer> {
        self.layers.iter_mut()
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store(count: usize) -> (LayerStore, StdRng) {
        let mut rng = StdRng::seed_from_u64(42);
        (LayerStore::new(count, 6, 0.3, &mut rng), rng)
    }

    #[test]
    fn test_store_shape() {
        let (store, _) = store(5);
        assert_eq!(store.len(), 5);
        for (i, layer) in store.iter().enumerate() {
            assert_eq!(layer.index(), i);
            assert_eq!(layer.grid_size(), 6);
        }
    }

    #[test]
    fn test_normalize_index() {
        let (store, _) = store(5);
        assert_eq!(store.normalize_index(5), 0);
        assert_eq!(store.normalize_index(7), 2);
        assert_eq!(store.normalize_index(-1), 4);
    }

    #[test]
    fn test_collapse_resets_ghost_and_attention() {
        let (mut store, mut rng) = store(5);
        {
            let layer = store.get_mut(2).unwrap();
            layer.memory_ghost_mut().add_scalar(0.8);
            layer.attend(2.0);
            layer.queue_bloom();
        }
        let before = store.get(2).unwrap().intensity().clone();

        let collapsed = store.collapse(2, &mut rng);
        assert_eq!(collapsed, 2);

        let layer = store.get(2).unwrap();
        assert_eq!(layer.memory_ghost().max(), 0.0);
        assert_eq!(layer.observer_attention(), 0.0);
        assert_eq!(layer.pending_blooms(), 1);
        assert_ne!(layer.intensity(), &before);
        assert!(layer.intensity().is_unit_range());
    }

    #[test]
    fn test_collapse_out_of_range_wraps_to_zero() {
        let (mut store, mut rng) = store(5);
        store.get_mut(0).unwrap().memory_ghost_mut().add_scalar(0.5);
        store.get_mut(1).unwrap().memory_ghost_mut().add_scalar(0.5);

        assert_eq!(store.collapse(5, &mut rng), 0);
        assert_eq!(store.get(0).unwrap().memory_ghost().max(), 0.0);
        assert_eq!(store.get(1).unwrap().memory_ghost().max(), 0.5);
    }

    #[test]
    fn test_replace_rejects_wrong_shape() {
        let (mut store, mut rng) = store(3);
        let wrong_size = Layer::collapsed(1, 7, &mut rng);
        assert!(store.replace(1, wrong_size).is_err());

        let wrong_index = Layer::collapsed(0, 6, &mut rng);
        assert!(store.replace(1, wrong_index).is_err());

        let ok = Layer::collapsed(1, 6, &mut rng);
        assert!(store.replace(1, ok).is_ok());
    }
}
