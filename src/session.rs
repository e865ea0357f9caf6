//! Session wiring
//!
//! A session owns the evolution engine and the dispatcher for one role:
//! host, client, or offline. It drives the animation tick at a fixed
//! cadence and hands each frame to a render sink.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use log::{info, warn};

use crate::config::GardenConfig;
use crate::engine::{EvolutionEngine, RenderSink, SharedParams, TickReport};
use crate::error::{GardenError, Result};
use crate::input::AudioLevel;
use crate::net::{local_ip, Beacon, ClientLink, CommandQueue, Dispatcher, Host, Link};

/// Session role chosen at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Client,
}

impl FromStr for Role {
    type Err = GardenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" => Ok(Role::Host),
            "client" => Ok(Role::Client),
            other => Err(GardenError::InvalidRole {
                input: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Client => write!(f, "client"),
        }
    }
}

/// One participant's running garden.
pub struct Session {
    config: GardenConfig,
    engine: EvolutionEngine,
    dispatcher: Dispatcher,
    audio: AudioLevel,
}

impl Session {
    /// A session with no peers.
    pub fn offline(config: GardenConfig) -> Result<Self> {
        config.validate()?;
        let queue = Arc::new(CommandQueue::new());
        Ok(Self::assemble(config, Arc::clone(&queue), Dispatcher::offline(queue)))
    }

    /// Host on `bind_addr`. The discovery beacon is not started here; see
    /// [`Session::start_beacon`].
    pub fn host(config: GardenConfig, bind_addr: SocketAddr) -> Result<Self> {
        config.validate()?;
        let queue = Arc::new(CommandQueue::new());
        let host = Host::start(bind_addr, Arc::clone(&queue), config.read_chunk)?;
        let dispatcher = Dispatcher::new(Arc::clone(&queue), Link::Host(host));
        Ok(Self::assemble(config, queue, dispatcher))
    }

    /// Host on all interfaces at the configured stream port.
    pub fn host_default(config: GardenConfig) -> Result<Self> {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.stream_port);
        Self::host(config, addr)
    }

    /// Join the host at `host_addr`.
    pub fn client(config: GardenConfig, host_addr: SocketAddr) -> Result<Self> {
        config.validate()?;
        let queue = Arc::new(CommandQueue::new());
        let link = ClientLink::connect(host_addr, Arc::clone(&queue), config.read_chunk)?;
        let dispatcher = Dispatcher::new(Arc::clone(&queue), Link::Client(link));
        Ok(Self::assemble(config, queue, dispatcher))
    }

    fn assemble(config: GardenConfig, queue: Arc<CommandQueue>, dispatcher: Dispatcher) -> Self {
        let audio = AudioLevel::new();
        let engine = EvolutionEngine::new(&config, SharedParams::default(), queue, audio.clone());
        Self {
            config,
            engine,
            dispatcher,
            audio,
        }
    }

    /// Start broadcasting this host's address for discovery.
    ///
    /// Does nothing for non-host sessions.
    pub fn start_beacon(&self) -> Result<()> {
        let Link::Host(host) = self.dispatcher.link() else {
            return Ok(());
        };
        let ip = match host.local_addr().ip() {
            ip if ip.is_unspecified() => local_ip(),
            ip => ip,
        };
        let beacon = Beacon::new(Beacon::broadcast_target(self.config.discovery_port), ip.to_string())?;
        beacon.spawn(self.config.discovery_interval())?;
        info!(
            "Announcing {} on discovery port {}",
            ip, self.config.discovery_port
        );
        Ok(())
    }

    pub fn config(&self) -> &GardenConfig {
        &self.config
    }

    pub fn engine(&self) -> &EvolutionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut EvolutionEngine {
        &mut self.engine
    }

    /// Handle for submitting locally-originated commands
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn params(&self) -> &SharedParams {
        self.engine.params()
    }

    /// Level handle for an audio driver to publish into
    pub fn audio_level(&self) -> &AudioLevel {
        &self.audio
    }

    /// Address the host is listening on, when hosting
    pub fn host_addr(&self) -> Option<SocketAddr> {
        match self.dispatcher.link() {
            Link::Host(host) => Some(host.local_addr()),
            _ => None,
        }
    }

    /// Run one tick now
    pub fn tick(&mut self) -> TickReport {
        self.engine.tick()
    }

    /// Tick at the configured cadence until `stop` is set or `max_frames`
    /// ticks have run. Render failures are logged and do not stop the loop.
    pub fn run(
        &mut self,
        sink: &mut dyn RenderSink,
        stop: &AtomicBool,
        max_frames: Option<u64>,
    ) -> u64 {
        let interval = self.config.tick_interval();
        let mut frames = 0;
        while !stop.load(Ordering::SeqCst) && max_frames.map_or(true, |max| frames < max) {
            let started = Instant::now();
            self.engine.tick();
            let frame = self.engine.frame();
            if let Err(e) = sink.present(&frame) {
                warn!("Render failed: {}", e);
            }
            frames += 1;
            if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }
        frames
    }
}
