use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{LogEntry, Term};

/// RequestVote RPC - Invoked by candidates to gather votes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestVoteRequest {
    /// Candidate's term
    pub term: Term,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestVoteResponse {
    /// Voter's term after handling the request
    pub term: Term,
    /// True means candidate received vote
    pub vote_granted: bool,
}

/// AppendEntries RPC - Invoked by leader to replicate log entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendEntriesRequest {
    /// Leader's term
    pub term: Term,
    /// Log entries to store, appended verbatim by the follower
    pub entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendEntriesResponse {
    /// Current term, for leader to update itself
    pub term: Term,
    /// False if the request carried a stale term
    pub success: bool,
}

/// Wrapper for all RPC messages.
///
/// Tagged by a `type` field; any tag not listed here decodes to `Unknown`,
/// which dispatch ignores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RaftMessage {
    #[serde(rename = "vote_request")]
    RequestVote(RequestVoteRequest),
    #[serde(rename = "vote_response")]
    RequestVoteResponse(RequestVoteResponse),
    AppendEntries(AppendEntriesRequest),
    AppendEntriesResponse(AppendEntriesResponse),
    #[serde(other)]
    Unknown,
}

impl RaftMessage {
    /// The term carried by the message, if any
    pub fn term(&self) -> Option<Term> {
        match self {
            RaftMessage::RequestVote(req) => Some(req.term),
            RaftMessage::RequestVoteResponse(resp) => Some(resp.term),
            RaftMessage::AppendEntries(req) => Some(req.term),
            RaftMessage::AppendEntriesResponse(resp) => Some(resp.term),
            RaftMessage::Unknown => None,
        }
    }
}

impl fmt::Display for RaftMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaftMessage::RequestVote(req) => write!(f, "vote_request(term: {})", req.term),
            RaftMessage::RequestVoteResponse(resp) => write!(
                f,
                "vote_response(term: {}, vote_granted: {})",
                resp.term, resp.vote_granted
            ),
            RaftMessage::AppendEntries(req) => {
                write!(f, "append_entries(term: {}, entries: [", req.term)?;
                for (i, entry) in req.entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", entry)?;
                }
                write!(f, "])")
            }
            RaftMessage::AppendEntriesResponse(resp) => write!(
                f,
                "append_entries_response(term: {}, success: {})",
                resp.term, resp.success
            ),
            RaftMessage::Unknown => write!(f, "unknown"),
        }
    }
}
