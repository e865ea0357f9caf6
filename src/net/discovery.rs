//! LAN host discovery
//!
//! The host repeatedly broadcasts its address as a bare UTF-8 datagram on
//! the discovery port. A starting client listens on that port for a
//! bounded time; hearing nothing is an ordinary outcome, after which the
//! user types the address in. Unauthenticated, and with several hosts on
//! one segment the first datagram to arrive wins.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};

use crate::error::{GardenError, Result};

/// Largest beacon payload accepted
const MAX_BEACON_BYTES: usize = 1024;

/// Periodic sender of the host's address.
#[derive(Debug)]
pub struct Beacon {
    socket: UdpSocket,
    target: SocketAddr,
    payload: Vec<u8>,
}

impl Beacon {
    /// Prepare a beacon sending `payload` to `target`.
    pub fn new(target: SocketAddr, payload: impl Into<String>) -> Result<Self> {
        let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);
        let socket =
            UdpSocket::bind(bind_addr).map_err(|e| GardenError::Bind { addr: bind_addr, source: e })?;
        socket.set_broadcast(true)?;
        Ok(Self {
            socket,
            target,
            payload: payload.into().into_bytes(),
        })
    }

    /// Limited-broadcast address for `port`
    pub fn broadcast_target(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), port)
    }

    /// Send a single datagram
    pub fn send_once(&self) -> Result<()> {
        self.socket.send_to(&self.payload, self.target)?;
        Ok(())
    }

    /// Send forever on a background thread, every `interval`.
    pub fn spawn(self, interval: Duration) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("garden-beacon".to_string())
            .spawn(move || {
                let mut failing = false;
                loop {
                    match self.send_once() {
                        Ok(()) => failing = false,
                        Err(e) if !failing => {
                            warn!("Discovery beacon to {} failed: {}", self.target, e);
                            failing = true;
                        }
                        Err(e) => debug!("Discovery beacon still failing: {}", e),
                    }
                    thread::sleep(interval);
                }
            })?;
        Ok(handle)
    }
}

/// Client-side listener for host beacons.
#[derive(Debug)]
pub struct HostListener {
    socket: UdpSocket,
}

impl HostListener {
    /// Listen on `port` on all interfaces (0 picks a free port).
    pub fn bind(port: u16) -> Result<Self> {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
        let socket = UdpSocket::bind(addr).map_err(|e| GardenError::Bind { addr, source: e })?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Wait up to `timeout` for one beacon.
    ///
    /// Returns the advertised address text, or `None` if nothing arrived.
    pub fn wait(&self, timeout: Duration) -> Result<Option<String>> {
        self.socket
            .set_read_timeout(Some(timeout.max(Duration::from_millis(1))))?;
        let mut buf = [0u8; MAX_BEACON_BYTES];
        match self.socket.recv_from(&mut buf) {
            Ok((n, from)) => {
                let advertised = String::from_utf8_lossy(&buf[..n]).trim().to_string();
                info!("Discovered host at {} (beacon from {})", advertised, from);
                Ok(Some(advertised))
            }
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                info!("No host discovered on LAN");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Listen on `port` for up to `timeout` and resolve whatever host answers.
pub fn discover_host(port: u16, timeout: Duration, stream_port: u16) -> Result<Option<SocketAddr>> {
    let listener = HostListener::bind(port)?;
    match listener.wait(timeout)? {
        Some(advertised) => resolve_host(&advertised, stream_port).map(Some),
        None => Ok(None),
    }
}

/// Turn `"ip"`, `"ip:port"` or `"hostname"` into a stream address.
pub fn resolve_host(input: &str, default_port: u16) -> Result<SocketAddr> {
    let input = input.trim();
    if input.is_empty() {
        return Err(GardenError::InvalidAddress {
            input: String::new(),
        });
    }
    if let Ok(addr) = input.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = input.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }
    (input, default_port)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| GardenError::InvalidAddress {
            input: input.to_string(),
        })
}

/// This machine's LAN-facing IPv4 address, or loopback if none is found.
///
/// Interface addresses are listed first, so an isolated network with no
/// default route still advertises a reachable address. When several
/// interfaces qualify, the one the OS would route outward through wins.
pub fn local_ip() -> IpAddr {
    select_local_ip(&interface_ipv4s(), routed_ip())
}

/// Non-loopback IPv4 addresses of the local interfaces, in listing order
fn interface_ipv4s() -> Vec<Ipv4Addr> {
    match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces
            .iter()
            .filter(|iface| !iface.is_loopback())
            .filter_map(|iface| match iface.ip() {
                IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
                _ => None,
            })
            .collect(),
        Err(e) => {
            debug!("Listing network interfaces failed: {}", e);
            Vec::new()
        }
    }
}

/// Source address of the default route. Connecting a UDP socket sends
/// nothing; it only asks the OS which local address routes outward.
fn routed_ip() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}

fn select_local_ip(interfaces: &[Ipv4Addr], routed: Option<Ipv4Addr>) -> IpAddr {
    let chosen = match routed {
        Some(ip) if interfaces.is_empty() || interfaces.contains(&ip) => Some(ip),
        _ => interfaces.first().copied().or(routed),
    };
    IpAddr::V4(chosen.unwrap_or(Ipv4Addr::LOCALHOST))
}
