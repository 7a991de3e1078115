// src/network/mod.rs
pub mod cluster;
pub mod peer_registry;
pub mod transport;

pub use cluster::Cluster;
pub use peer_registry::PeerRegistry;
pub use transport::{DeliveryMode, DropReason, Envelope, OutboundMessage, SendOutcome, Transport};
