pub mod election;
pub mod log;
pub mod node;
pub mod rpc;
pub mod state;
pub mod types;

pub use log::ReplicatedLog;
pub use node::{NodeStatus, RaftNode};
pub use rpc::RaftMessage;
pub use state::{NodeState, RaftState};
pub use types::{LogEntry, NodeId, Term};
