//! Distribution Layer Module
//!
//! - `CommandQueue`: inbound commands awaiting the next tick
//! - `ConnectionRegistry`: the host's live client connections
//! - `Host` / `ClientLink`: the two session roles' transports
//! - `Dispatcher`: local-apply-and-forward for local commands
//! - `discovery`: LAN beacon and listener

pub mod client;
pub mod discovery;
pub mod dispatch;
pub mod host;
pub mod queue;
pub mod registry;
mod stream;

pub use client::ClientLink;
pub use discovery::{discover_host, local_ip, resolve_host, Beacon, HostListener};
pub use dispatch::{CommandSink, Dispatcher, Link};
pub use host::Host;
pub use queue::CommandQueue;
pub use registry::{ConnectionRegistry, Peer, PeerId};
