use std::collections::{BTreeMap, VecDeque};

use super::transport::{
    DeliveryMode, DropReason, Envelope, OutboundMessage, SendOutcome, Transport,
};
use crate::config::ClusterConfig;
use crate::raft::node::{NodeStatus, RaftNode};
use crate::raft::rpc::RaftMessage;
use crate::raft::types::NodeId;
use crate::util::errors::{RaftError, Result};

/// In-process network of simulated nodes.
///
/// The cluster owns every node and is the only path between them: node
/// operations return outbound messages, and the cluster carries them to
/// the recipients, feeding replies back in until nothing is left to send.
#[derive(Debug)]
pub struct Cluster {
    nodes: BTreeMap<NodeId, RaftNode>,
    mode: DeliveryMode,
    in_flight: VecDeque<Envelope>,
}

impl Cluster {
    pub fn new(mode: DeliveryMode) -> Self {
        Self {
            nodes: BTreeMap::new(),
            mode,
            in_flight: VecDeque::new(),
        }
    }

    /// Build the nodes named in `config`, fully meshed if requested
    pub fn from_config(config: &ClusterConfig) -> Result<Self> {
        config.validate().map_err(RaftError::InvalidConfig)?;

        let mut cluster = Self::new(config.delivery);
        for id in &config.node_ids {
            cluster.add_node(*id)?;
        }
        if config.full_mesh {
            cluster.connect_all();
        }

        tracing::info!(
            "Cluster created with nodes {:?} ({:?} delivery)",
            config.node_ids,
            config.delivery
        );

        Ok(cluster)
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub fn add_node(&mut self, id: NodeId) -> Result<()> {
        self.insert_node(RaftNode::new(id))
    }

    /// Add a node built by the caller, e.g. one with a custom recorder
    pub fn insert_node(&mut self, node: RaftNode) -> Result<()> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(RaftError::DuplicateNode(id));
        }
        self.nodes.insert(id, node);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&RaftNode> {
        self.nodes.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut RaftNode> {
        self.nodes.get_mut(&id).ok_or(RaftError::UnknownNode(id))
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    /// Make `peer` reachable from `node`. One direction only.
    pub fn add_peer(&mut self, node: NodeId, peer: NodeId) -> Result<()> {
        if node == peer {
            tracing::warn!("Refusing to register node {} as its own peer", node);
            return Err(RaftError::SelfPeer(node));
        }
        if !self.nodes.contains_key(&peer) {
            return Err(RaftError::UnknownNode(peer));
        }
        self.node_mut(node)?.add_peer(peer);
        Ok(())
    }

    /// Make `peer` unreachable from `node`. One direction only.
    pub fn remove_peer(&mut self, node: NodeId, peer: NodeId) -> Result<()> {
        if !self.nodes.contains_key(&peer) {
            return Err(RaftError::UnknownNode(peer));
        }
        self.node_mut(node)?.remove_peer(peer);
        Ok(())
    }

    /// Peer every node with every other node
    pub fn connect_all(&mut self) {
        let ids = self.node_ids();
        for node in self.nodes.values_mut() {
            let id = node.id();
            for peer in ids.iter().copied().filter(|p| *p != id) {
                node.add_peer(peer);
            }
        }
    }

    pub fn propose_state(&mut self, node: NodeId, value: impl Into<Vec<u8>>) -> Result<()> {
        let outbound = self.node_mut(node)?.propose_state(value);
        self.send_all(node, outbound)
    }

    pub fn start_election(&mut self, node: NodeId) -> Result<()> {
        let outbound = self.node_mut(node)?.start_election();
        self.send_all(node, outbound)
    }

    pub fn retrieve_activity_log(&self, node: NodeId) -> Result<String> {
        self.nodes
            .get(&node)
            .map(|n| n.retrieve_activity_log())
            .ok_or(RaftError::UnknownNode(node))
    }

    pub fn clear_activity_log(&mut self, node: NodeId) -> Result<()> {
        self.node_mut(node)?.clear_activity_log();
        Ok(())
    }

    pub fn clear_activity_logs(&mut self) {
        for node in self.nodes.values_mut() {
            node.clear_activity_log();
        }
    }

    pub fn status(&self, node: NodeId) -> Result<NodeStatus> {
        self.nodes
            .get(&node)
            .map(|n| n.status())
            .ok_or(RaftError::UnknownNode(node))
    }

    pub fn statuses(&self) -> Vec<NodeStatus> {
        self.nodes.values().map(|n| n.status()).collect()
    }

    /// Nodes currently in the Leader role. More than one is possible when
    /// partitions keep a stale leader from hearing about a newer term.
    pub fn leaders(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.is_leader())
            .map(|n| n.id())
            .collect()
    }

    /// Messages queued but not yet delivered
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Inject a raw message as if `from` had produced it
    pub fn send_message(
        &mut self,
        from: NodeId,
        to: NodeId,
        message: RaftMessage,
    ) -> Result<SendOutcome> {
        self.send(from, OutboundMessage::new(to, message))
    }

    /// Returns false when the receiver was inactive and dropped the message
    fn deliver(&mut self, envelope: Envelope) -> Result<bool> {
        let Envelope { from, to, message } = envelope;
        let receiver = self.node_mut(to)?;
        let active = receiver.is_active();
        let replies = receiver.receive(from, message);
        self.send_all(to, replies)?;
        Ok(active)
    }
}

impl Transport for Cluster {
    fn send(&mut self, from: NodeId, outbound: OutboundMessage) -> Result<SendOutcome> {
        let OutboundMessage { to, message } = outbound;
        let sender = self.node_mut(from)?;

        if !sender.is_active() {
            sender.record(format!(
                "Failed to transmit message to Node {}: Node inactive",
                to
            ));
            tracing::debug!("Node {} is inactive, dropping message to {}", from, to);
            return Ok(SendOutcome::Dropped(DropReason::SenderInactive));
        }

        if !sender.has_peer(to) {
            sender.record(format!(
                "Failed to transmit message to Node {}: Not a peer",
                to
            ));
            tracing::debug!("Node {} cannot reach {}: not a peer", from, to);
            return Ok(SendOutcome::Dropped(DropReason::NotAPeer));
        }

        let summary = message.to_string();
        let envelope = Envelope { from, to, message };

        match self.mode {
            DeliveryMode::Immediate => {
                let delivered = self.deliver(envelope)?;
                self.node_mut(from)?
                    .record(format!("Transmitted message to Node {}: {}", to, summary));
                if delivered {
                    Ok(SendOutcome::Delivered)
                } else {
                    Ok(SendOutcome::Dropped(DropReason::ReceiverInactive))
                }
            }
            DeliveryMode::Queued => {
                self.node_mut(from)?
                    .record(format!("Transmitted message to Node {}: {}", to, summary));
                if !self.node_mut(to)?.is_active() {
                    tracing::debug!("Node {} is inactive, not queueing message from {}", to, from);
                    return Ok(SendOutcome::Dropped(DropReason::ReceiverInactive));
                }
                self.in_flight.push_back(envelope);
                Ok(SendOutcome::Queued)
            }
        }
    }

    fn flush(&mut self) -> Result<usize> {
        let mut delivered = 0;
        while let Some(envelope) = self.in_flight.pop_front() {
            if self.deliver(envelope)? {
                delivered += 1;
            }
        }

        if delivered > 0 {
            tracing::debug!("Flushed {} queued messages", delivered);
        }

        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raft::rpc::RequestVoteRequest;
    use crate::raft::state::NodeState;
    use crate::raft::types::LogEntry;

    fn mesh(mode: DeliveryMode, ids: &[NodeId]) -> Cluster {
        let mut cluster = Cluster::new(mode);
        for id in ids {
            cluster.add_node(*id).unwrap();
        }
        cluster.connect_all();
        cluster
    }

    fn log_data(cluster: &Cluster, id: NodeId) -> Vec<String> {
        cluster
            .node(id)
            .unwrap()
            .log_entries()
            .iter()
            .map(LogEntry::data_lossy)
            .collect()
    }

    #[test]
    fn test_connect_all_builds_symmetric_mesh() {
        let cluster = mesh(DeliveryMode::Immediate, &[1, 2, 3]);
        for id in [1, 2, 3] {
            let node = cluster.node(id).unwrap();
            assert_eq!(node.peers().len(), 2);
            assert!(!node.has_peer(id));
        }
        assert!(cluster.node(2).unwrap().has_peer(1));
        assert!(cluster.node(1).unwrap().has_peer(2));
    }

    #[test]
    fn test_driver_errors() {
        let mut cluster = mesh(DeliveryMode::Immediate, &[1, 2]);
        assert!(matches!(cluster.add_node(1), Err(RaftError::DuplicateNode(1))));
        assert!(matches!(cluster.add_peer(1, 1), Err(RaftError::SelfPeer(1))));
        assert!(matches!(cluster.add_peer(1, 9), Err(RaftError::UnknownNode(9))));
        assert!(matches!(cluster.start_election(9), Err(RaftError::UnknownNode(9))));
        assert!(matches!(
            cluster.retrieve_activity_log(9),
            Err(RaftError::UnknownNode(9))
        ));
    }

    #[test]
    fn test_first_candidate_wins_with_immediate_delivery() {
        let mut cluster = mesh(DeliveryMode::Immediate, &[1, 2, 3]);

        cluster.start_election(1).unwrap();

        assert_eq!(cluster.leaders(), vec![1]);
        let leader = cluster.node(1).unwrap();
        assert_eq!(leader.term(), 1);
        assert_eq!(leader.vote_count(), 3);
        for id in [2, 3] {
            let follower = cluster.node(id).unwrap();
            assert_eq!(follower.term(), 1);
            assert_eq!(follower.voted_for(), Some(1));
            assert_eq!(follower.role(), NodeState::Follower);
        }
    }

    #[test]
    fn test_extra_vote_records_leadership_again() {
        let mut cluster = mesh(DeliveryMode::Immediate, &[1, 2, 3]);

        cluster.start_election(1).unwrap();

        let activity = cluster.retrieve_activity_log(1).unwrap();
        let became_leader: Vec<_> = activity
            .lines()
            .filter(|line| *line == "Became leader for term 1")
            .collect();
        assert_eq!(became_leader.len(), 2);
        assert_eq!(cluster.leaders(), vec![1]);
    }

    #[test]
    fn test_activity_order_follows_call_cascade() {
        let mut cluster = mesh(DeliveryMode::Immediate, &[1, 2]);

        cluster.start_election(1).unwrap();

        assert_eq!(
            cluster.retrieve_activity_log(1).unwrap(),
            [
                "Started election for term 1",
                "Received message from Node 2: vote_response(term: 1, vote_granted: true)",
                "Became leader for term 1",
                "Transmitted message to Node 2: vote_request(term: 1)",
            ]
            .join("\n")
        );
        assert_eq!(
            cluster.retrieve_activity_log(2).unwrap(),
            [
                "Received message from Node 1: vote_request(term: 1)",
                "Transmitted message to Node 1: vote_response(term: 1, vote_granted: true)",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_sequential_elections_leave_last_candidate_leading() {
        let mut cluster = mesh(DeliveryMode::Immediate, &[1, 2, 3]);

        for id in [1, 2, 3] {
            cluster.start_election(id).unwrap();
        }

        assert_eq!(cluster.leaders(), vec![3]);
        for id in [1, 2, 3] {
            assert_eq!(cluster.node(id).unwrap().term(), 3);
        }
    }

    #[test]
    fn test_simultaneous_elections_elect_nobody() {
        let mut cluster = mesh(DeliveryMode::Queued, &[1, 2, 3]);

        for id in [1, 2, 3] {
            cluster.start_election(id).unwrap();
        }
        assert_eq!(cluster.pending(), 6);

        // Six vote requests, six denials
        assert_eq!(cluster.flush().unwrap(), 12);
        assert!(cluster.leaders().is_empty());
        for id in [1, 2, 3] {
            let node = cluster.node(id).unwrap();
            assert_eq!(node.role(), NodeState::Candidate);
            assert_eq!(node.term(), 1);
            assert_eq!(node.vote_count(), 1);
        }

        for (id, value) in [(1, "State E"), (2, "State F"), (3, "State G")] {
            cluster.propose_state(id, value).unwrap();
        }
        assert_eq!(cluster.flush().unwrap(), 0);
        assert_eq!(log_data(&cluster, 1), vec!["State E"]);
        assert_eq!(log_data(&cluster, 2), vec!["State F"]);
        assert_eq!(log_data(&cluster, 3), vec!["State G"]);
    }

    #[test]
    fn test_leader_replicates_to_every_peer() {
        let mut cluster = mesh(DeliveryMode::Immediate, &[1, 2, 3]);
        cluster.start_election(2).unwrap();

        cluster.propose_state(2, "State A").unwrap();

        for id in [1, 2, 3] {
            assert_eq!(log_data(&cluster, id), vec!["State A"]);
            assert_eq!(cluster.node(id).unwrap().log_entries()[0].term, 1);
        }
        assert!(cluster
            .retrieve_activity_log(1)
            .unwrap()
            .contains("Transmitted message to Node 2: append_entries_response(term: 1, success: true)"));
    }

    #[test]
    fn test_queued_replication_needs_flush() {
        let mut cluster = mesh(DeliveryMode::Queued, &[1, 2]);
        cluster.start_election(1).unwrap();
        cluster.flush().unwrap();
        assert_eq!(cluster.leaders(), vec![1]);

        cluster.propose_state(1, "v").unwrap();
        assert!(cluster.node(2).unwrap().log_entries().is_empty());

        cluster.flush().unwrap();
        assert_eq!(log_data(&cluster, 2), vec!["v"]);
    }

    #[test]
    fn test_send_to_non_peer_is_logged_and_dropped() {
        let mut cluster = mesh(DeliveryMode::Immediate, &[1, 2]);
        cluster.remove_peer(1, 2).unwrap();

        let outcome = cluster
            .send_message(1, 2, RaftMessage::RequestVote(RequestVoteRequest { term: 5 }))
            .unwrap();

        assert_eq!(outcome, SendOutcome::Dropped(DropReason::NotAPeer));
        assert_eq!(
            cluster.retrieve_activity_log(1).unwrap(),
            "Failed to transmit message to Node 2: Not a peer"
        );
        assert_eq!(cluster.node(2).unwrap().term(), 0);
        assert_eq!(cluster.retrieve_activity_log(2).unwrap(), "");
    }

    #[test]
    fn test_stale_append_entries_is_rejected() {
        let mut cluster = mesh(DeliveryMode::Immediate, &[1, 2, 3]);
        cluster.start_election(1).unwrap();
        cluster.start_election(2).unwrap();
        // Node 1 stepped down at term 2; forge a leader-style message at term 1
        cluster
            .send_message(
                3,
                1,
                RaftMessage::AppendEntries(crate::raft::rpc::AppendEntriesRequest {
                    term: 1,
                    entries: vec![LogEntry::new(1, b"stale".to_vec())],
                }),
            )
            .unwrap();

        assert!(cluster.node(1).unwrap().log_entries().is_empty());
        assert!(cluster
            .retrieve_activity_log(3)
            .unwrap()
            .contains("append_entries_response(term: 2, success: false)"));
    }

    #[test]
    fn test_clear_activity_logs() {
        let mut cluster = mesh(DeliveryMode::Immediate, &[1, 2]);
        cluster.start_election(1).unwrap();

        cluster.clear_activity_logs();

        assert_eq!(cluster.retrieve_activity_log(1).unwrap(), "");
        assert_eq!(cluster.retrieve_activity_log(2).unwrap(), "");
    }

    #[test]
    fn test_from_config() {
        let config = ClusterConfig {
            node_ids: vec![7, 8],
            full_mesh: false,
            delivery: DeliveryMode::Queued,
        };

        let cluster = Cluster::from_config(&config).unwrap();

        assert_eq!(cluster.node_ids(), vec![7, 8]);
        assert_eq!(cluster.mode(), DeliveryMode::Queued);
        assert!(cluster.node(7).unwrap().peers().is_empty());
    }
}
