use crate::error::{BridgeError, BridgeResult};
use crate::protocol::OutboundMessage;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

/// Ordered channel to the client.
pub trait Transport {
    fn send(&mut self, message: OutboundMessage) -> BridgeResult<()>;

    /// Re-establishes the channel. Most transports have nothing to do.
    fn reconnect(&mut self) -> BridgeResult<()> {
        Ok(())
    }
}

/// Forwards outbound messages into a tokio channel.
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    sender: UnboundedSender<OutboundMessage>,
}

impl ChannelTransport {
    pub fn new(sender: UnboundedSender<OutboundMessage>) -> Self {
        Self { sender }
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, message: OutboundMessage) -> BridgeResult<()> {
        self.sender
            .send(message)
            .map_err(|err| BridgeError::Transport(format!("client went away: {err}")))
    }
}

/// Keeps every sent message in memory. Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct MemoryTransport {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    reconnects: Arc<Mutex<usize>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Takes the messages sent so far.
    pub fn take(&self) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .map(|mut v| std::mem::take(&mut *v))
            .unwrap_or_default()
    }

    pub fn reconnects(&self) -> usize {
        self.reconnects.lock().map(|n| *n).unwrap_or_default()
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, message: OutboundMessage) -> BridgeResult<()> {
        self.sent
            .lock()
            .map_err(|_| BridgeError::Transport("message log poisoned".to_string()))?
            .push(message);
        Ok(())
    }

    fn reconnect(&mut self) -> BridgeResult<()> {
        *self
            .reconnects
            .lock()
            .map_err(|_| BridgeError::Transport("message log poisoned".to_string()))? += 1;
        Ok(())
    }
}
