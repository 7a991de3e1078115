use super::rpc::{RequestVoteRequest, RequestVoteResponse};
use super::state::RaftState;
use super::types::NodeId;

/// Handle incoming RequestVote RPC.
///
/// A vote is granted only for a strictly higher term. Equal-term requests are
/// denied even when `voted_for` is unset, and there is no log comparison.
pub fn handle_request_vote(
    raft_state: &mut RaftState,
    candidate_id: NodeId,
    request: &RequestVoteRequest,
) -> RequestVoteResponse {
    tracing::debug!(
        "Node {} received RequestVote from {} (term: {})",
        raft_state.node_id,
        candidate_id,
        request.term
    );

    if raft_state.update_term(request.term) {
        raft_state.voted_for = Some(candidate_id);

        tracing::info!(
            "Node {} granted vote to {} in term {}",
            raft_state.node_id,
            candidate_id,
            request.term
        );

        return RequestVoteResponse {
            term: request.term,
            vote_granted: true,
        };
    }

    tracing::debug!(
        "Node {} denied vote to {} - request term {} <= current term {}",
        raft_state.node_id,
        candidate_id,
        request.term,
        raft_state.current_term
    );

    RequestVoteResponse {
        term: raft_state.current_term,
        vote_granted: false,
    }
}

/// Handle incoming RequestVote response.
///
/// Returns true when the tally holds a majority; the caller then
/// transitions to leader. A sitting leader that gets another grant is told
/// to become leader again. Denials are ignored whatever their term.
pub fn handle_request_vote_response(
    raft_state: &mut RaftState,
    from: NodeId,
    response: &RequestVoteResponse,
    peer_count: usize,
) -> bool {
    if !response.vote_granted {
        return false;
    }

    if raft_state.is_follower() {
        tracing::debug!(
            "Node {} ignoring late vote from {} - no longer a candidate",
            raft_state.node_id,
            from
        );
        return false;
    }

    raft_state.add_vote();

    tracing::debug!(
        "Node {} received vote from {} ({} votes, {} peers)",
        raft_state.node_id,
        from,
        raft_state.vote_count,
        peer_count
    );

    raft_state.has_majority(peer_count)
}

/// Create a RequestVote request for this node's current term
pub fn create_request_vote(raft_state: &RaftState) -> RequestVoteRequest {
    RequestVoteRequest {
        term: raft_state.current_term,
    }
}
