//! Square grid of floating-point cells
//!
//! Row-major storage; the side length is fixed at construction.

use rand::Rng;

/// A `size x size` grid of `f32` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    size: usize,
    cells: Vec<f32>,
}

impl Grid {
    /// Create a grid with every cell set to zero
    pub fn zeros(size: usize) -> Self {
        Self::filled(size, 0.0)
    }

    /// Create a grid with every cell set to `value`
    pub fn filled(size: usize, value: f32) -> Self {
        Self {
            size,
            cells: vec![value; size * size],
        }
    }

    /// Create a grid of independent uniform noise in `[0, scale)`
    pub fn noise<R: Rng + ?Sized>(size: usize, scale: f32, rng: &mut R) -> Self {
        let cells = (0..size * size).map(|_| rng.gen::<f32>() * scale).collect();
        Self { size, cells }
    }

    /// Side length
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [f32] {
        &mut self.cells
    }

    /// Cell at `(row, col)`, or `None` outside the grid
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.cells.get(row * self.size + col).copied()
    }

    /// Clamp every cell into `[0, 1]`
    pub fn clamp01(&mut self) {
        for cell in &mut self.cells {
            *cell = cell.clamp(0.0, 1.0);
        }
    }

    /// `self += other * factor`, cell by cell. No clamping.
    pub fn add_scaled(&mut self, other: &Grid, factor: f32) {
        debug_assert_eq!(self.size, other.size, "grid shapes must match");
        for (cell, source) in self.cells.iter_mut().zip(&other.cells) {
            *cell += source * factor;
        }
    }

    /// Add a constant to every cell. No clamping.
    pub fn add_scalar(&mut self, value: f32) {
        for cell in &mut self.cells {
            *cell += value;
        }
    }

    /// Multiply every cell by `factor`
    pub fn scale(&mut self, factor: f32) {
        for cell in &mut self.cells {
            *cell *= factor;
        }
    }

    /// Add fresh uniform noise in `[0, scale)` to every cell. No clamping.
    pub fn add_noise<R: Rng + ?Sized>(&mut self, scale: f32, rng: &mut R) {
        for cell in &mut self.cells {
            *cell += rng.gen::<f32>() * scale;
        }
    }

    /// Reset every cell to zero
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = 0.0);
    }

    /// Mean cell value (0 for an empty grid)
    pub fn mean(&self) -> f32 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.cells.iter().sum::<f32>() / self.cells.len() as f32
    }

    pub fn max(&self) -> f32 {
        self.cells.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn min(&self) -> f32 {
        self.cells.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// True when every cell lies in `[0, 1]`
    pub fn is_unit_range(&self) -> bool {
        self.cells.iter().all(|c| (0.0..=1.0).contains(c))
    }
}
