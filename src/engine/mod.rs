//! Garden Engine Module
//!
//! - Shared performance parameters
//! - Per-tick evolution of the layer store
//! - Render-boundary frame derivation

pub mod evolution;
pub mod params;
pub mod render;

pub use evolution::{EvolutionEngine, TickReport};
pub use params::{PerformanceParams, SharedParams};
pub use render::{Frame, RenderSink, TerminalStrip};
