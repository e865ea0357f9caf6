//! Distribution of locally-originated commands
//!
//! A local command is queued for this process's own next tick and also
//! forwarded to peers: broadcast to every client when hosting, sent to the
//! host when a client. Once drained, a local command is indistinguishable
//! from one that arrived over the network.

use std::sync::Arc;

use log::{debug, warn};

use super::client::ClientLink;
use super::host::Host;
use super::queue::CommandQueue;
use crate::protocol::Command;

/// Anything that accepts commands produced by an input source.
pub trait CommandSink: Send + Sync {
    fn submit(&self, command: Command);
}

impl CommandSink for CommandQueue {
    fn submit(&self, command: Command) {
        self.push(command);
    }
}

/// Where local commands are forwarded besides the local queue.
#[derive(Debug, Clone)]
pub enum Link {
    /// No peers; commands only apply locally
    Offline,
    Host(Host),
    Client(Arc<ClientLink>),
}

/// Applies local commands locally and forwards them to peers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    queue: Arc<CommandQueue>,
    link: Link,
}

impl Dispatcher {
    pub fn new(queue: Arc<CommandQueue>, link: Link) -> Self {
        Self { queue, link }
    }

    pub fn offline(queue: Arc<CommandQueue>) -> Self {
        Self::new(queue, Link::Offline)
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    pub fn queue(&self) -> &Arc<CommandQueue> {
        &self.queue
    }

    /// Queue locally, then forward. Forwarding failures are logged only.
    pub fn dispatch(&self, command: Command) {
        self.queue.push(command.clone());
        match &self.link {
            Link::Offline => {}
            Link::Host(host) => match host.broadcast(&command) {
                Ok(delivered) => debug!("Broadcast {} to {} clients", command, delivered),
                Err(e) => warn!("Broadcast of {} failed: {}", command, e),
            },
            Link::Client(client) => {
                if let Err(e) = client.send(&command) {
                    warn!("Could not send {} to host: {}", command, e);
                }
            }
        }
    }
}

impl CommandSink for Dispatcher {
    fn submit(&self, command: Command) {
        self.dispatch(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Adjustment;

    #[test]
    fn test_offline_dispatch_queues_locally() {
        let queue = Arc::new(CommandQueue::new());
        let dispatcher = Dispatcher::offline(Arc::clone(&queue));
        dispatcher.dispatch(Command::Adjust(Adjustment::NeonGlow(false)));
        dispatcher.submit(Command::Collapse { layer: 1 });
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_queue_is_a_sink() {
        let queue = CommandQueue::new();
        let sink: &dyn CommandSink = &queue;
        sink.submit(Command::MidiTrigger { layer: 0 });
        assert_eq!(queue.drain(), vec![Command::MidiTrigger { layer: 0 }]);
    }
}
