use serde::{Deserialize, Serialize};

use crate::raft::rpc::RaftMessage;
use crate::raft::types::NodeId;
use crate::util::errors::Result;

/// A message a node wants sent, produced by its protocol handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: NodeId,
    pub message: RaftMessage,
}

impl OutboundMessage {
    pub fn new(to: NodeId, message: RaftMessage) -> Self {
        Self { to, message }
    }
}

/// A message in flight between two nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: NodeId,
    pub to: NodeId,
    pub message: RaftMessage,
}

/// How a transport hands messages to the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Deliver synchronously; the whole reply cascade completes before
    /// `send` returns
    #[default]
    Immediate,
    /// Queue messages until `flush` is called
    Queued,
}

/// Why the sender dropped a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Recipient is not in the sender's peer set
    NotAPeer,
    /// Sender has failed
    SenderInactive,
    /// Recipient has failed. The sender still records the message as
    /// transmitted.
    ReceiverInactive,
}

/// Result of a single send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    Queued,
    Dropped(DropReason),
}

/// Moves messages between nodes
pub trait Transport {
    /// Send one message from `from`. Errors only for unknown node ids.
    fn send(&mut self, from: NodeId, outbound: OutboundMessage) -> Result<SendOutcome>;

    /// Deliver everything pending, including replies, until nothing is left.
    /// Returns the number of messages that reached an active node.
    fn flush(&mut self) -> Result<usize>;

    /// Send a batch in order
    fn send_all(&mut self, from: NodeId, outbound: Vec<OutboundMessage>) -> Result<()> {
        for message in outbound {
            self.send(from, message)?;
        }
        Ok(())
    }
}
