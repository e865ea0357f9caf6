//! Host role
//!
//! Accepts client streams, runs one reader thread per connection that
//! feeds the shared inbound queue, and fans local commands out to every
//! registered client.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use super::queue::CommandQueue;
use super::registry::ConnectionRegistry;
use super::stream::pump_commands;
use crate::error::{GardenError, Result};
use crate::protocol::Command;

/// Upper bound on how long a send to one client may block
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Handle to a running host: its address and its client registry.
#[derive(Debug, Clone)]
pub struct Host {
    local_addr: SocketAddr,
    registry: Arc<ConnectionRegistry>,
}

impl Host {
    /// Bind `addr` and start accepting clients in the background.
    ///
    /// Commands read from any client are appended to `queue`.
    pub fn start(addr: SocketAddr, queue: Arc<CommandQueue>, read_chunk: usize) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| GardenError::Bind { addr, source: e })?;
        let local_addr = listener.local_addr()?;
        let registry = Arc::new(ConnectionRegistry::new());

        let accept_registry = Arc::clone(&registry);
        thread::Builder::new()
            .name("garden-accept".to_string())
            .spawn(move || accept_loop(listener, accept_registry, queue, read_chunk))?;

        info!("Hosting garden on {}", local_addr);
        Ok(Self {
            local_addr,
            registry,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Number of connected clients
    pub fn peer_count(&self) -> usize {
        self.registry.len()
    }

    /// Serialize once and send to every client. Returns the delivery count.
    pub fn broadcast(&self, command: &Command) -> Result<usize> {
        let payload = command.encode()?;
        Ok(self.registry.broadcast(&payload))
    }
}

fn accept_loop(
    listener: TcpListener,
    registry: Arc<ConnectionRegistry>,
    queue: Arc<CommandQueue>,
    read_chunk: usize,
) {
    for incoming in listener.incoming() {
        match incoming {
            Ok(stream) => {
                if let Err(e) = admit(stream, &registry, &queue, read_chunk) {
                    warn!("Could not admit client: {}", e);
                }
            }
            Err(e) => warn!("Accept failed: {}", e),
        }
    }
}

fn admit(
    stream: TcpStream,
    registry: &Arc<ConnectionRegistry>,
    queue: &Arc<CommandQueue>,
    read_chunk: usize,
) -> Result<()> {
    let addr = stream.peer_addr()?;
    stream.set_nodelay(true)?;
    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
    let reader = stream.try_clone()?;
    let id = registry.register(addr, stream);
    info!("Client connected: {}", addr);

    let peer_registry = Arc::clone(registry);
    let queue = Arc::clone(queue);
    let spawned = thread::Builder::new()
        .name(format!("garden-peer-{}", addr))
        .spawn(move || {
            let received = pump_commands(reader, &queue, read_chunk);
            if peer_registry.remove(id) {
                info!("Client disconnected: {} ({} commands)", addr, received);
            } else {
                debug!("Reader for {} ended after prune", addr);
            }
        });
    if let Err(e) = spawned {
        registry.remove(id);
        return Err(e.into());
    }
    Ok(())
}
