//! Neon Garden - Collaborative LAN Visual Garden
//!
//! Several participants on one network drive a shared, layered grid
//! visualization that reacts to audio, MIDI notes and control-panel moves.
//!
//! # Architecture
//!
//! - Layers: per-layer intensity, memory ghost, attention and blooms
//! - Engine: one-tick evolution (decay, diffusion, reactivity, commands)
//! - Protocol: the adjust / collapse / midi command vocabulary
//! - Net: host fan-out, client link, inbound queue, LAN discovery
//!
//! Every input, local or remote, becomes a `Command`. Commands are queued,
//! drained once per tick, and applied before the physics step, so all
//! participants evolve from the same stream of changes.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod layers;
pub mod net;
pub mod protocol;
pub mod session;

pub use config::GardenConfig;
pub use error::{GardenError, Result};
pub use session::{Role, Session};
