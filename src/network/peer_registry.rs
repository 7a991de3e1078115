use crate::raft::types::NodeId;

/// The set of peers a node can reach, in the order they were added.
///
/// The registry never checks that a node is not registered as its own
/// peer; callers must not add the owning node.
#[derive(Debug, Clone, Default)]
pub struct PeerRegistry {
    peers: Vec<NodeId>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self { peers: Vec::new() }
    }

    /// Register a peer. Returns false if it was already present.
    pub fn add_peer(&mut self, node_id: NodeId) -> bool {
        if self.peers.contains(&node_id) {
            return false;
        }
        self.peers.push(node_id);
        true
    }

    /// Remove a peer. Returns false if it was not present.
    pub fn remove_peer(&mut self, node_id: NodeId) -> bool {
        let before = self.peers.len();
        self.peers.retain(|p| *p != node_id);
        self.peers.len() != before
    }

    /// Check if a node is registered
    pub fn has_peer(&self, node_id: NodeId) -> bool {
        self.peers.contains(&node_id)
    }

    /// Get all registered node IDs, in insertion order
    pub fn all_node_ids(&self) -> Vec<NodeId> {
        self.peers.clone()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
