//! Client role
//!
//! One outbound stream to the host. Local commands are written straight
//! onto it; a background reader feeds host broadcasts into the inbound
//! queue.

use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;

use super::queue::CommandQueue;
use super::stream::pump_commands;
use crate::error::{GardenError, Result};
use crate::protocol::Command;

/// How long to wait for the host to accept
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on how long one send may block
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Live connection to the host.
#[derive(Debug)]
pub struct ClientLink {
    host: SocketAddr,
    writer: Mutex<TcpStream>,
    connected: Arc<AtomicBool>,
}

impl ClientLink {
    /// Connect to `host` and start reading its broadcasts into `queue`.
    pub fn connect(host: SocketAddr, queue: Arc<CommandQueue>, read_chunk: usize) -> Result<Arc<Self>> {
        let stream = TcpStream::connect_timeout(&host, CONNECT_TIMEOUT)
            .map_err(|e| GardenError::Connect { addr: host, source: e })?;
        stream.set_nodelay(true)?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        let reader = stream.try_clone()?;
        let connected = Arc::new(AtomicBool::new(true));

        let reader_connected = Arc::clone(&connected);
        thread::Builder::new()
            .name("garden-host-reader".to_string())
            .spawn(move || {
                let received = pump_commands(reader, &queue, read_chunk);
                reader_connected.store(false, Ordering::SeqCst);
                warn!("Host {} closed the stream after {} commands", host, received);
            })?;

        info!("Connected to host {}", host);
        Ok(Arc::new(Self {
            host,
            writer: Mutex::new(stream),
            connected,
        }))
    }

    pub fn host_addr(&self) -> SocketAddr {
        self.host
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send one command to the host.
    ///
    /// A failed write marks the link dead; later sends fail fast.
    pub fn send(&self, command: &Command) -> Result<()> {
        if !self.is_connected() {
            return Err(GardenError::NotConnected);
        }
        let payload = command.encode()?;
        let mut stream = self.writer.lock();
        stream
            .write_all(&payload)
            .and_then(|()| stream.flush())
            .map_err(|e| {
                self.connected.store(false, Ordering::SeqCst);
                GardenError::SendFailed {
                    peer: self.host,
                    source: e,
                }
            })
    }

    /// Close the stream; the reader thread exits on its own.
    pub fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        if let Err(e) = self.writer.lock().shutdown(Shutdown::Both) {
            debug!("Shutdown of link to {} reported: {}", self.host, e);
        }
    }
}

// The reader thread holds a clone of the socket, so dropping the writer
// alone would leave the stream open.
impl Drop for ClientLink {
    fn drop(&mut self) {
        self.close();
    }
}
