use serde::{Deserialize, Serialize};

use super::election::{create_request_vote, handle_request_vote, handle_request_vote_response};
use super::log::{
    create_append_entries, handle_append_entries, handle_append_entries_response, ReplicatedLog,
};
use super::rpc::RaftMessage;
use super::state::{NodeState, RaftState};
use super::types::{LogEntry, NodeId, Term};
use crate::activity::{ActivityLog, ActivityRecorder};
use crate::network::peer_registry::PeerRegistry;
use crate::network::transport::OutboundMessage;

/// Snapshot of a node, for monitoring and the demo output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub node_id: NodeId,
    pub state: NodeState,
    pub current_term: Term,
    pub voted_for: Option<NodeId>,
    pub vote_count: usize,
    pub log_length: usize,
    pub current_state: Option<String>,
    pub active: bool,
    pub peers: Vec<NodeId>,
}

/// A single simulated Raft node.
///
/// Operations never reach into other nodes: they mutate this node and return
/// the messages it wants sent. A `Transport` carries those messages and feeds
/// replies back through [`RaftNode::receive`].
pub struct RaftNode {
    state: RaftState,
    log: ReplicatedLog,
    peers: PeerRegistry,
    current_state: Option<Vec<u8>>,
    active: bool,
    activity: Box<dyn ActivityRecorder>,
}

impl RaftNode {
    pub fn new(node_id: NodeId) -> Self {
        Self::with_recorder(node_id, Box::new(ActivityLog::new(node_id)))
    }

    pub fn with_recorder(node_id: NodeId, activity: Box<dyn ActivityRecorder>) -> Self {
        Self {
            state: RaftState::new(node_id),
            log: ReplicatedLog::new(),
            peers: PeerRegistry::new(),
            current_state: None,
            active: true,
            activity,
        }
    }

    pub fn id(&self) -> NodeId {
        self.state.node_id
    }

    pub fn term(&self) -> Term {
        self.state.current_term
    }

    pub fn role(&self) -> NodeState {
        self.state.state
    }

    pub fn voted_for(&self) -> Option<NodeId> {
        self.state.voted_for
    }

    pub fn vote_count(&self) -> usize {
        self.state.vote_count
    }

    pub fn is_leader(&self) -> bool {
        self.state.is_leader()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn log_entries(&self) -> &[LogEntry] {
        self.log.entries()
    }

    pub fn current_state(&self) -> Option<&[u8]> {
        self.current_state.as_deref()
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    /// Precondition: `peer` is not this node.
    pub fn add_peer(&mut self, peer: NodeId) -> bool {
        debug_assert_ne!(peer, self.id(), "a node cannot be its own peer");
        self.peers.add_peer(peer)
    }

    pub fn remove_peer(&mut self, peer: NodeId) -> bool {
        self.peers.remove_peer(peer)
    }

    pub fn has_peer(&self, peer: NodeId) -> bool {
        self.peers.has_peer(peer)
    }

    pub fn record(&mut self, event: String) {
        self.activity.record(event);
    }

    pub fn retrieve_activity_log(&self) -> String {
        self.activity.retrieve()
    }

    pub fn activity_events(&self) -> Vec<String> {
        self.activity.events()
    }

    pub fn clear_activity_log(&mut self) {
        self.activity.clear();
    }

    /// Stop sending and receiving. Peer links are left alone.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Resume with whatever term, role and log the node had
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Record `value` in the local log; leaders also replicate it to every
    /// peer. Followers and candidates never forward proposals.
    pub fn propose_state(&mut self, value: impl Into<Vec<u8>>) -> Vec<OutboundMessage> {
        let entry = LogEntry::new(self.state.current_term, value.into());
        self.current_state = Some(entry.data.clone());
        self.record(format!("Suggested new state: {}", entry.data_lossy()));
        self.log.append(entry.clone());

        if !self.state.is_leader() {
            return Vec::new();
        }

        tracing::debug!(
            "Leader {} replicating entry at term {} to {} peers",
            self.id(),
            entry.term,
            self.peers.len()
        );

        let request = create_append_entries(&self.state, vec![entry]);
        self.broadcast(RaftMessage::AppendEntries(request))
    }

    /// Become a candidate for the next term and ask every peer for a vote.
    /// Does nothing while inactive.
    pub fn start_election(&mut self) -> Vec<OutboundMessage> {
        if !self.active {
            tracing::debug!("Node {} is inactive, not starting election", self.id());
            return Vec::new();
        }

        self.state.become_candidate();
        self.record(format!(
            "Started election for term {}",
            self.state.current_term
        ));

        let request = create_request_vote(&self.state);
        self.broadcast(RaftMessage::RequestVote(request))
    }

    pub fn become_leader(&mut self) {
        self.state.become_leader();
        self.record(format!(
            "Became leader for term {}",
            self.state.current_term
        ));
    }

    /// Entry point for delivered messages. Inactive nodes drop them without
    /// a trace.
    pub fn receive(&mut self, from: NodeId, message: RaftMessage) -> Vec<OutboundMessage> {
        if !self.active {
            tracing::debug!(
                "Node {} is inactive, dropping message from {}",
                self.id(),
                from
            );
            return Vec::new();
        }

        self.record(format!("Received message from Node {}: {}", from, message));
        self.handle_message(from, message)
    }

    /// Route a message to its handler and return any reply
    pub fn handle_message(&mut self, from: NodeId, message: RaftMessage) -> Vec<OutboundMessage> {
        match message {
            RaftMessage::RequestVote(request) => {
                let response = handle_request_vote(&mut self.state, from, &request);
                vec![OutboundMessage::new(
                    from,
                    RaftMessage::RequestVoteResponse(response),
                )]
            }

            RaftMessage::RequestVoteResponse(response) => {
                let won_election = handle_request_vote_response(
                    &mut self.state,
                    from,
                    &response,
                    self.peers.len(),
                );

                if won_election {
                    self.become_leader();
                }

                Vec::new()
            }

            RaftMessage::AppendEntries(request) => {
                let response = handle_append_entries(&mut self.state, &mut self.log, from, request);
                vec![OutboundMessage::new(
                    from,
                    RaftMessage::AppendEntriesResponse(response),
                )]
            }

            RaftMessage::AppendEntriesResponse(response) => {
                handle_append_entries_response(&self.state, from, &response);
                Vec::new()
            }

            RaftMessage::Unknown => Vec::new(),
        }
    }

    pub fn status(&self) -> NodeStatus {
        NodeStatus {
            node_id: self.id(),
            state: self.state.state,
            current_term: self.state.current_term,
            voted_for: self.state.voted_for,
            vote_count: self.state.vote_count,
            log_length: self.log.len(),
            current_state: self
                .current_state
                .as_ref()
                .map(|data| String::from_utf8_lossy(data).into_owned()),
            active: self.active,
            peers: self.peers.all_node_ids(),
        }
    }

    fn broadcast(&self, message: RaftMessage) -> Vec<OutboundMessage> {
        self.peers
            .all_node_ids()
            .into_iter()
            .map(|peer| OutboundMessage::new(peer, message.clone()))
            .collect()
    }
}

impl std::fmt::Debug for RaftNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaftNode")
            .field("state", &self.state)
            .field("log", &self.log)
            .field("peers", &self.peers)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raft::rpc::{
        AppendEntriesRequest, AppendEntriesResponse, RequestVoteRequest, RequestVoteResponse,
    };
    use std::sync::{Arc, Mutex};

    fn node_with_peers(id: NodeId, peers: &[NodeId]) -> RaftNode {
        let mut node = RaftNode::new(id);
        for peer in peers {
            node.add_peer(*peer);
        }
        node
    }

    #[test]
    fn test_new_node_defaults() {
        let node = RaftNode::new(1);
        assert_eq!(node.term(), 0);
        assert_eq!(node.role(), NodeState::Follower);
        assert!(node.is_active());
        assert!(node.peers().is_empty());
        assert!(node.log_entries().is_empty());
        assert_eq!(node.current_state(), None);
    }

    #[test]
    fn test_start_election_requests_votes_from_every_peer() {
        let mut node = node_with_peers(1, &[2, 3]);

        let outbound = node.start_election();

        assert_eq!(node.role(), NodeState::Candidate);
        assert_eq!(node.term(), 1);
        assert_eq!(node.voted_for(), Some(1));
        assert_eq!(node.vote_count(), 1);
        let targets: Vec<NodeId> = outbound.iter().map(|m| m.to).collect();
        assert_eq!(targets, vec![2, 3]);
        assert!(outbound
            .iter()
            .all(|m| m.message == RaftMessage::RequestVote(RequestVoteRequest { term: 1 })));
        assert_eq!(node.retrieve_activity_log(), "Started election for term 1");
    }

    #[test]
    fn test_inactive_node_does_not_start_election() {
        let mut node = node_with_peers(1, &[2]);
        node.deactivate();

        assert!(node.start_election().is_empty());
        assert_eq!(node.term(), 0);
        assert_eq!(node.role(), NodeState::Follower);
    }

    #[test]
    fn test_follower_proposal_stays_local() {
        let mut node = node_with_peers(1, &[2, 3]);

        let outbound = node.propose_state("State A");

        assert!(outbound.is_empty());
        assert_eq!(node.log_entries(), &[LogEntry::new(0, b"State A".to_vec())]);
        assert_eq!(node.current_state(), Some(&b"State A"[..]));
        assert_eq!(node.retrieve_activity_log(), "Suggested new state: State A");
    }

    #[test]
    fn test_leader_proposal_replicates_to_peers() {
        let mut node = node_with_peers(1, &[2, 3]);
        node.start_election();
        node.handle_message(
            2,
            RaftMessage::RequestVoteResponse(RequestVoteResponse {
                term: 1,
                vote_granted: true,
            }),
        );
        assert!(node.is_leader());

        let outbound = node.propose_state("x");

        assert_eq!(outbound.len(), 2);
        assert_eq!(
            outbound[0].message,
            RaftMessage::AppendEntries(AppendEntriesRequest {
                term: 1,
                entries: vec![LogEntry::new(1, b"x".to_vec())],
            })
        );
    }

    #[test]
    fn test_vote_request_is_answered() {
        let mut node = node_with_peers(1, &[2]);

        let outbound = node.receive(2, RaftMessage::RequestVote(RequestVoteRequest { term: 3 }));

        assert_eq!(
            outbound,
            vec![OutboundMessage::new(
                2,
                RaftMessage::RequestVoteResponse(RequestVoteResponse {
                    term: 3,
                    vote_granted: true,
                }),
            )]
        );
        assert_eq!(node.term(), 3);
        assert_eq!(node.voted_for(), Some(2));
        assert_eq!(
            node.retrieve_activity_log(),
            "Received message from Node 2: vote_request(term: 3)"
        );
    }

    #[test]
    fn test_append_entries_is_answered() {
        let mut node = node_with_peers(1, &[2]);

        let outbound = node.receive(
            2,
            RaftMessage::AppendEntries(AppendEntriesRequest {
                term: 2,
                entries: vec![LogEntry::new(2, b"v".to_vec())],
            }),
        );

        assert_eq!(
            outbound[0].message,
            RaftMessage::AppendEntriesResponse(AppendEntriesResponse {
                term: 2,
                success: true,
            })
        );
        assert_eq!(node.log_entries().len(), 1);
    }

    #[test]
    fn test_inactive_node_drops_silently() {
        let mut node = node_with_peers(1, &[2]);
        node.deactivate();

        let outbound = node.receive(2, RaftMessage::RequestVote(RequestVoteRequest { term: 3 }));

        assert!(outbound.is_empty());
        assert_eq!(node.term(), 0);
        assert_eq!(node.retrieve_activity_log(), "");
    }

    #[test]
    fn test_unknown_message_is_ignored() {
        let mut node = node_with_peers(1, &[2]);

        let outbound = node.receive(2, RaftMessage::Unknown);

        assert!(outbound.is_empty());
        assert_eq!(node.term(), 0);
        assert_eq!(node.activity_events(), vec!["Received message from Node 2: unknown"]);
    }

    #[test]
    fn test_append_entries_response_changes_nothing() {
        let mut node = node_with_peers(1, &[2]);
        node.start_election();

        let outbound = node.handle_message(
            2,
            RaftMessage::AppendEntriesResponse(AppendEntriesResponse {
                term: 9,
                success: false,
            }),
        );

        assert!(outbound.is_empty());
        assert_eq!(node.term(), 1);
        assert_eq!(node.role(), NodeState::Candidate);
    }

    #[derive(Clone, Default)]
    struct SharedRecorder(Arc<Mutex<Vec<String>>>);

    impl ActivityRecorder for SharedRecorder {
        fn record(&mut self, event: String) {
            self.0.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }

        fn clear(&mut self) {
            self.0.lock().unwrap().clear();
        }
    }

    #[test]
    fn test_injected_recorder_receives_events() {
        let recorder = SharedRecorder::default();
        let mut node = RaftNode::with_recorder(1, Box::new(recorder.clone()));

        node.propose_state("State Z");

        assert_eq!(
            recorder.0.lock().unwrap().as_slice(),
            ["Suggested new state: State Z".to_string()]
        );
    }

    #[test]
    fn test_status_snapshot() {
        let mut node = node_with_peers(4, &[5]);
        node.propose_state("hello");

        let status = node.status();
        assert_eq!(status.node_id, 4);
        assert_eq!(status.log_length, 1);
        assert_eq!(status.current_state.as_deref(), Some("hello"));
        assert_eq!(status.peers, vec![5]);
        assert!(status.active);
    }
}
