use std::io;

use thiserror::Error;

use crate::raft::types::NodeId;

/// Errors raised by the driver layer (cluster, config, actor).
///
/// The protocol itself never fails: dropped or stale messages are recorded
/// in the activity log and otherwise ignored.
#[derive(Debug, Error)]
pub enum RaftError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("Node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("Node {0} cannot be its own peer")]
    SelfPeer(NodeId),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RaftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(RaftError::UnknownNode(7).to_string(), "Unknown node: 7");
        assert_eq!(
            RaftError::SelfPeer(2).to_string(),
            "Node 2 cannot be its own peer"
        );
    }

    #[test]
    fn test_from_serde_error() {
        let err: RaftError = serde_json::from_str::<u64>("nope").unwrap_err().into();
        assert!(matches!(err, RaftError::SerializationError(_)));
    }
}
