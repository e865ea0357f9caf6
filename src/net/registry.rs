//! Connection registry (host side)
//!
//! Tracks live client connections. Broadcasts iterate over a snapshot so
//! that peers connecting or disconnecting mid-send never tear the list;
//! peers whose write fails are pruned afterwards.

use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

/// Identifier assigned to each accepted connection
pub type PeerId = Uuid;

/// Write half of one registered connection.
#[derive(Debug, Clone)]
pub struct Peer {
    id: PeerId,
    addr: SocketAddr,
    writer: Arc<Mutex<TcpStream>>,
}

impl Peer {
    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Write one whole payload. The per-peer lock keeps concurrent
    /// broadcasts from interleaving their bytes.
    pub fn send(&self, payload: &[u8]) -> std::io::Result<()> {
        let mut stream = self.writer.lock();
        stream.write_all(payload)?;
        stream.flush()
    }

    fn close(&self) {
        if let Err(e) = self.writer.lock().shutdown(Shutdown::Both) {
            debug!("Shutdown of {} reported: {}", self.addr, e);
        }
    }
}

/// Set of live peer connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    peers: RwLock<Vec<Peer>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection's write half and return its id
    pub fn register(&self, addr: SocketAddr, stream: TcpStream) -> PeerId {
        let id = Uuid::new_v4();
        self.peers.write().push(Peer {
            id,
            addr,
            writer: Arc::new(Mutex::new(stream)),
        });
        id
    }

    /// Drop a connection and shut its socket down.
    ///
    /// Returns false if the peer was already gone.
    pub fn remove(&self, id: PeerId) -> bool {
        let removed = {
            let mut peers = self.peers.write();
            peers
                .iter()
                .position(|peer| peer.id == id)
                .map(|index| peers.remove(index))
        };
        match removed {
            Some(peer) => {
                peer.close();
                true
            }
            None => false,
        }
    }

    /// Copy of the current peer list
    pub fn snapshot(&self) -> Vec<Peer> {
        self.peers.read().clone()
    }

    pub fn contains(&self, id: PeerId) -> bool {
        self.peers.read().iter().any(|peer| peer.id == id)
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    /// Send `payload` to every registered peer, pruning those that fail.
    ///
    /// Returns the number of peers that accepted the payload.
    pub fn broadcast(&self, payload: &[u8]) -> usize {
        let mut delivered = 0;
        let mut failed = Vec::new();
        for peer in self.snapshot() {
            match peer.send(payload) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Dropping peer {}: {}", peer.addr, e);
                    failed.push(peer.id);
                }
            }
        }
        for id in failed {
            self.remove(id);
        }
        delivered
    }
}
