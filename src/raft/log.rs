use super::rpc::{AppendEntriesRequest, AppendEntriesResponse};
use super::state::RaftState;
use super::types::{LogEntry, NodeId};

/// Append-only sequence of log entries.
///
/// Entries are never truncated, reordered or rewritten once appended.
#[derive(Debug, Clone, Default)]
pub struct ReplicatedLog {
    entries: Vec<LogEntry>,
}

impl ReplicatedLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Append entries verbatim, with no deduplication or conflict checks
    pub fn extend(&mut self, entries: impl IntoIterator<Item = LogEntry>) {
        self.entries.extend(entries);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Handle incoming AppendEntries RPC
pub fn handle_append_entries(
    raft_state: &mut RaftState,
    log: &mut ReplicatedLog,
    leader_id: NodeId,
    request: AppendEntriesRequest,
) -> AppendEntriesResponse {
    // Reply false if term < currentTerm
    if request.term < raft_state.current_term {
        tracing::debug!(
            "Node {} rejected AppendEntries from {} - stale term ({} < {})",
            raft_state.node_id,
            leader_id,
            request.term,
            raft_state.current_term
        );

        return AppendEntriesResponse {
            term: raft_state.current_term,
            success: false,
        };
    }

    // Any leader at our term or above makes us a follower, leaders included
    raft_state.become_follower(request.term);

    let count = request.entries.len();
    log.extend(request.entries);

    tracing::debug!(
        "Node {} appended {} entries from leader {} (log length: {})",
        raft_state.node_id,
        count,
        leader_id,
        log.len()
    );

    AppendEntriesResponse {
        term: raft_state.current_term,
        success: true,
    }
}

/// Handle AppendEntries response (for leaders).
///
/// Leaders do not track follower progress, so the response changes nothing.
pub fn handle_append_entries_response(
    raft_state: &RaftState,
    from: NodeId,
    response: &AppendEntriesResponse,
) {
    if response.success {
        tracing::debug!(
            "Node {} got replication ack from {} (term: {})",
            raft_state.node_id,
            from,
            response.term
        );
    } else {
        tracing::debug!(
            "Node {} got replication rejection from {} (term: {})",
            raft_state.node_id,
            from,
            response.term
        );
    }
}

/// Create AppendEntries request carrying `entries` at the current term
pub fn create_append_entries(raft_state: &RaftState, entries: Vec<LogEntry>) -> AppendEntriesRequest {
    AppendEntriesRequest {
        term: raft_state.current_term,
        entries,
    }
}
