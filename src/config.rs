//! Session configuration
//!
//! Defaults reproduce the classic installation: 17 layers of 30x30 cells,
//! stream port 5000, discovery on 5001, a 50 ms animation tick.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GardenError, Result};

// ============================================================================
// Defaults
// ============================================================================

/// Number of depth layers
pub const DEFAULT_LAYERS: usize = 17;

/// Side length of each square layer grid
pub const DEFAULT_GRID_SIZE: usize = 30;

/// TCP port for the command stream
pub const DEFAULT_STREAM_PORT: u16 = 5000;

/// UDP port the host beacon broadcasts on
pub const DEFAULT_DISCOVERY_PORT: u16 = 5001;

/// Depth falloff per layer index for the display blend
pub const DEFAULT_DEPTH_FALLOFF: f32 = 0.03;

/// Runtime configuration for a garden session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenConfig {
    /// Number of layers (N)
    pub layers: usize,
    /// Grid side length; every layer is `grid_size x grid_size`
    pub grid_size: usize,
    /// Port the host listens on for client streams
    pub stream_port: u16,
    /// Port used for host discovery datagrams
    pub discovery_port: u16,
    /// Interval between discovery beacons
    pub discovery_interval_ms: u64,
    /// How long a client waits for a beacon before asking for an address
    pub discovery_timeout_ms: u64,
    /// Animation tick cadence
    pub tick_interval_ms: u64,
    /// `k` in `depthFactor(i) = 1 - i*k`
    pub depth_falloff: f32,
    /// Scale of the startup noise in each layer's intensity
    pub initial_intensity: f32,
    /// Bytes requested per stream read
    pub read_chunk: usize,
    /// MIDI poll cadence
    pub midi_poll_interval_ms: u64,
}

impl Default for GardenConfig {
    fn default() -> Self {
        Self {
            layers: DEFAULT_LAYERS,
            grid_size: DEFAULT_GRID_SIZE,
            stream_port: DEFAULT_STREAM_PORT,
            discovery_port: DEFAULT_DISCOVERY_PORT,
            discovery_interval_ms: 1000,
            discovery_timeout_ms: 10_000,
            tick_interval_ms: 50,
            depth_falloff: DEFAULT_DEPTH_FALLOFF,
            initial_intensity: 0.3,
            read_chunk: 1024,
            midi_poll_interval_ms: 10,
        }
    }
}

impl GardenConfig {
    /// Load a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults. The result is validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| GardenError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: GardenConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.layers == 0 {
            return Err(invalid("layers must be at least 1"));
        }
        if self.grid_size == 0 {
            return Err(invalid("grid_size must be at least 1"));
        }
        if self.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms must be positive"));
        }
        if self.read_chunk == 0 {
            return Err(invalid("read_chunk must be positive"));
        }
        let deepest = 1.0 - (self.layers - 1) as f32 * self.depth_falloff;
        if !self.depth_falloff.is_finite() || self.depth_falloff < 0.0 || deepest < 0.0 {
            return Err(GardenError::InvalidConfig {
                reason: format!(
                    "depth_falloff {} gives a negative depth factor for layer {}",
                    self.depth_falloff,
                    self.layers - 1
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.initial_intensity) {
            return Err(invalid("initial_intensity must be within 0..=1"));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_millis(self.discovery_interval_ms)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn midi_poll_interval(&self) -> Duration {
        Duration::from_millis(self.midi_poll_interval_ms)
    }
}

fn invalid(reason: &str) -> GardenError {
    GardenError::InvalidConfig {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = GardenConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layers, 17);
        assert_eq!(config.grid_size, 30);
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"layers": 5, "stream_port": 6000}}"#).unwrap();

        let config = GardenConfig::load(file.path()).unwrap();
        assert_eq!(config.layers, 5);
        assert_eq!(config.stream_port, 6000);
        assert_eq!(config.grid_size, DEFAULT_GRID_SIZE);
        assert_eq!(config.discovery_port, DEFAULT_DISCOVERY_PORT);
    }

    #[test]
    fn test_load_missing_file() {
        let err = GardenConfig::load(Path::new("/nonexistent/garden.json")).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_READ");
    }

    #[test]
    fn test_rejects_negative_depth_factor() {
        let config = GardenConfig {
            layers: 40,
            depth_falloff: 0.05,
            ..GardenConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nan_depth_falloff() {
        let config = GardenConfig {
            depth_falloff: f32::NAN,
            ..GardenConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GardenError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_layers() {
        let config = GardenConfig {
            layers: 0,
            ..GardenConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GardenError::InvalidConfig { .. })
        ));
    }
}
