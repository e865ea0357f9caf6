//! Render boundary
//!
//! The plotting surface is external; this module derives what it draws.
//! Display values blend intensity with the memory ghost and dim deeper
//! layers. Overlay symbols are decorative and re-rolled every frame.

use std::io::Write;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::Result;
use crate::layers::{Grid, Layer, LayerStore};

/// Geometric sigils, drawn in cyan
pub const SIGILS: [&str; 5] = ["⊱", "⟡", "⚚", "⩀", "⦿"];

/// Emoji accents, drawn in amber
pub const EMOJIS: [&str; 9] = ["🌸", "✨", "🫧", "🌼", "💫", "🍃", "🌙", "⚡", "🪞"];

const SIGIL_COLOR: [f32; 3] = [0.2, 1.0, 1.0];
const EMOJI_COLOR: [f32; 3] = [1.0, 0.8, 0.2];

/// Weight of intensity in the displayed blend
const INTENSITY_WEIGHT: f32 = 0.8;

/// Weight of the memory ghost in the displayed blend
const GHOST_WEIGHT: f32 = 0.2;

/// `1 - index * falloff`
pub fn depth_factor(index: usize, falloff: f32) -> f32 {
    1.0 - index as f32 * falloff
}

/// `(intensity * 0.8 + ghost * 0.2) * depth_factor`
pub fn display_values(layer: &Layer, falloff: f32) -> Grid {
    let depth = depth_factor(layer.index(), falloff);
    let mut values = layer.intensity().clone();
    values.scale(INTENSITY_WEIGHT);
    values.add_scaled(layer.memory_ghost(), GHOST_WEIGHT);
    values.scale(depth);
    values
}

/// A decorative glyph placed on a layer for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySymbol {
    pub row: usize,
    pub col: usize,
    pub glyph: &'static str,
    pub color: [f32; 3],
    pub alpha: f32,
}

/// Scatter 5 to 18 symbols over a `grid_size` grid.
///
/// With neon glow on, alpha flickers by `sin(r * frame * 0.1) * 0.2`.
pub fn overlay_symbols<R: Rng + ?Sized>(
    rng: &mut R,
    grid_size: usize,
    frame: u64,
    neon_glow: bool,
) -> Vec<OverlaySymbol> {
    if grid_size == 0 {
        return Vec::new();
    }
    let count = rng.gen_range(5..=18);
    (0..count)
        .map(|_| {
            let row = rng.gen_range(0..grid_size);
            let col = rng.gen_range(0..grid_size);
            let is_sigil = rng.gen_range(0..SIGILS.len() + EMOJIS.len()) < SIGILS.len();
            let (glyph, color) = if is_sigil {
                (SIGILS.choose(rng).copied().unwrap_or(SIGILS[0]), SIGIL_COLOR)
            } else {
                (EMOJIS.choose(rng).copied().unwrap_or(EMOJIS[0]), EMOJI_COLOR)
            };
            let mut alpha = 0.5 + rng.gen::<f32>() * 0.5;
            if neon_glow {
                alpha += (rng.gen::<f32>() * frame as f32 * 0.1).sin() * 0.2;
            }
            OverlaySymbol {
                row,
                col,
                glyph,
                color,
                alpha: alpha.clamp(0.0, 1.0),
            }
        })
        .collect()
}

/// Display data for one layer
#[derive(Debug, Clone)]
pub struct DisplayLayer {
    pub index: usize,
    pub depth_factor: f32,
    pub values: Grid,
    pub overlays: Vec<OverlaySymbol>,
}

/// Everything the plotting surface needs for one tick.
#[derive(Debug, Clone)]
pub struct Frame {
    pub tick: u64,
    pub neon_glow: bool,
    pub layers: Vec<DisplayLayer>,
}

impl Frame {
    pub fn build<R: Rng + ?Sized>(
        store: &LayerStore,
        tick: u64,
        neon_glow: bool,
        falloff: f32,
        rng: &mut R,
    ) -> Self {
        let layers = store
            .iter()
            .map(|layer| DisplayLayer {
                index: layer.index(),
                depth_factor: depth_factor(layer.index(), falloff),
                values: display_values(layer, falloff),
                overlays: overlay_symbols(rng, store.grid_size(), tick, neon_glow),
            })
            .collect();
        Self {
            tick,
            neon_glow,
            layers,
        }
    }
}

/// Anything that can show a frame.
pub trait RenderSink {
    fn present(&mut self, frame: &Frame) -> Result<()>;
}

/// Shade ramp from dark to bright
const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];

/// Minimal text sink: one shade character per layer, every `every` frames.
pub struct TerminalStrip<W: Write> {
    out: W,
    every: u64,
}

impl<W: Write> TerminalStrip<W> {
    pub fn new(out: W, every: u64) -> Self {
        Self {
            out,
            every: every.max(1),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSink for TerminalStrip<W> {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        if frame.tick % self.every != 0 {
            return Ok(());
        }
        let strip: String = frame
            .layers
            .iter()
            .map(|layer| shade(layer.values.mean()))
            .collect();
        let glow = if frame.neon_glow { "*" } else { " " };
        writeln!(self.out, "{:>6} {}|{}|", frame.tick, glow, strip)?;
        self.out.flush()?;
        Ok(())
    }
}

fn shade(value: f32) -> char {
    let step = (value.clamp(0.0, 1.0) * (SHADES.len() - 1) as f32).round() as usize;
    SHADES[step.min(SHADES.len() - 1)]
}
