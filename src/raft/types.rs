use serde::{Deserialize, Serialize};
use std::fmt;

/// A single entry in the replicated log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    /// The term when this entry was created
    pub term: Term,
    /// The proposed value, opaque to the protocol
    pub data: Vec<u8>,
}

impl LogEntry {
    pub fn new(term: Term, data: Vec<u8>) -> Self {
        Self { term, data }
    }

    /// The payload rendered as text, for activity records and status output
    pub fn data_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{term: {}, state: {}}}", self.term, self.data_lossy())
    }
}

/// Type alias for term numbers
pub type Term = u64;

/// Node identifier
pub type NodeId = u64;
