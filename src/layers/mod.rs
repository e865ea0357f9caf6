//! Layer Model Module
//!
//! - `Grid`: square cell array
//! - `Layer`: one depth slice (intensity, memory ghost, attention, blooms)
//! - `LayerStore`: the fixed set of layers a session evolves

mod grid;
mod layer;
mod store;

pub use grid::Grid;
pub use layer::Layer;
pub use store::LayerStore;
