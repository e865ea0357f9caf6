//! CLI Module
//!
//! Command-line surface for the garden: role selection, address entry and
//! config overrides.

pub mod console;

use std::io::{BufRead, Write};
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::GardenConfig;
use crate::error::{GardenError, Result};
use crate::net::resolve_host;
use crate::session::Role;

/// Collaborative Neon Garden - a shared LAN visual garden
#[derive(Parser, Debug)]
#[command(name = "neon-garden")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Session role: 'host' or 'client' (asked interactively when omitted)
    #[arg(value_name = "ROLE")]
    pub role: Option<String>,

    /// Host address for a client, skipping LAN discovery
    #[arg(long)]
    pub host: Option<String>,

    /// JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of layers
    #[arg(long)]
    pub layers: Option<usize>,

    /// Grid side length
    #[arg(long)]
    pub grid_size: Option<usize>,

    /// Command stream port
    #[arg(long)]
    pub port: Option<u16>,

    /// Discovery datagram port
    #[arg(long)]
    pub discovery_port: Option<u16>,

    /// Milliseconds between animation ticks
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Print the terminal strip every N frames
    #[arg(long, default_value_t = 20)]
    pub render_every: u64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    pub fn load_config(&self) -> Result<GardenConfig> {
        let mut config = match &self.config {
            Some(path) => GardenConfig::load(path)?,
            None => GardenConfig::default(),
        };
        if let Some(layers) = self.layers {
            config.layers = layers;
        }
        if let Some(grid_size) = self.grid_size {
            config.grid_size = grid_size;
        }
        if let Some(port) = self.port {
            config.stream_port = port;
        }
        if let Some(port) = self.discovery_port {
            config.discovery_port = port;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_interval_ms = tick_ms;
        }
        config.validate()?;
        Ok(config)
    }

    /// Role from the command line, if one was given.
    pub fn role(&self) -> Option<Result<Role>> {
        self.role.as_deref().map(str::parse)
    }
}

/// Ask for the session role.
pub fn prompt_role<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Role> {
    let answer = prompt(input, output, "Select mode [host/client]: ")?;
    answer.parse()
}

/// Ask for the host address after discovery came up empty.
pub fn prompt_host_address<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    default_port: u16,
) -> Result<SocketAddr> {
    let answer = prompt(input, output, "Enter host IP manually: ")?;
    resolve_host(&answer, default_port)
}

fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    if line.is_empty() {
        return Err(GardenError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "input closed before an answer was given",
        )));
    }
    Ok(line.trim().to_string())
}
