use serde::{Deserialize, Serialize};

use super::types::{NodeId, Term};

/// The three states a Raft node can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// Follower state - receives updates from leader
    Follower,
    /// Candidate state - requesting votes for leadership
    Candidate,
    /// Leader state - replicates proposals to peers
    Leader,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeState::Follower => write!(f, "Follower"),
            NodeState::Candidate => write!(f, "Candidate"),
            NodeState::Leader => write!(f, "Leader"),
        }
    }
}

/// Term, vote and role state of a Raft node
#[derive(Debug, Clone)]
pub struct RaftState {
    /// This node's ID
    pub node_id: NodeId,
    /// Latest term this node has seen (initialized to 0, never decreases)
    pub current_term: Term,
    /// Node that received our vote. Never cleared, only overwritten.
    pub voted_for: Option<NodeId>,
    /// Current role of this node
    pub state: NodeState,
    /// Granted votes including our own; meaningful only while Candidate
    pub vote_count: usize,
}

impl RaftState {
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            current_term: 0,
            voted_for: None,
            state: NodeState::Follower,
            vote_count: 0,
        }
    }

    /// Transition to follower state at `term`.
    ///
    /// `voted_for` is left as is.
    pub fn become_follower(&mut self, term: Term) {
        if self.state != NodeState::Follower {
            tracing::info!(
                "Node {} transitioning to Follower (term: {})",
                self.node_id,
                term
            );
        }
        self.state = NodeState::Follower;
        self.current_term = self.current_term.max(term);
    }

    /// Transition to candidate state, voting for ourselves
    pub fn become_candidate(&mut self) {
        // Terms stop at u64::MAX rather than wrap
        self.current_term = self.current_term.saturating_add(1);
        self.state = NodeState::Candidate;
        self.voted_for = Some(self.node_id);
        self.vote_count = 1;

        tracing::info!(
            "Node {} transitioning to Candidate (term: {})",
            self.node_id,
            self.current_term
        );
    }

    /// Transition to leader state
    pub fn become_leader(&mut self) {
        tracing::info!(
            "Node {} transitioning to Leader (term: {}, votes: {})",
            self.node_id,
            self.current_term,
            self.vote_count
        );
        self.state = NodeState::Leader;
    }

    /// Count one more granted vote
    pub fn add_vote(&mut self) {
        self.vote_count += 1;
    }

    /// Strict majority of the peer set; our own vote is already in the tally
    pub fn has_majority(&self, peer_count: usize) -> bool {
        self.vote_count > peer_count / 2
    }

    /// Adopt a higher term and step down. Returns whether the term changed.
    pub fn update_term(&mut self, term: Term) -> bool {
        if term > self.current_term {
            tracing::info!(
                "Node {} updating term from {} to {}",
                self.node_id,
                self.current_term,
                term
            );
            self.become_follower(term);
            true
        } else {
            false
        }
    }

    /// Check if we're the leader
    pub fn is_leader(&self) -> bool {
        self.state == NodeState::Leader
    }

    /// Check if we're a candidate
    pub fn is_candidate(&self) -> bool {
        self.state == NodeState::Candidate
    }

    /// Check if we're a follower
    pub fn is_follower(&self) -> bool {
        self.state == NodeState::Follower
    }
}
