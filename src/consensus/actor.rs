use actix::prelude::*;

use crate::fault::FaultInjector;
use crate::network::cluster::Cluster;
use crate::network::transport::Transport;
use crate::raft::node::NodeStatus;
use crate::raft::types::NodeId;
use crate::util::errors::Result;

/// Actor that owns a simulated cluster.
///
/// Every handler runs its operation to quiescence (or, with queued delivery,
/// until the queue is populated) before replying, so operations sent through
/// one address are observed in mailbox order.
pub struct ClusterActor {
    cluster: Cluster,
}

impl ClusterActor {
    pub fn new(cluster: Cluster) -> Self {
        Self { cluster }
    }
}

impl Actor for ClusterActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            "Cluster actor started with nodes {:?}",
            self.cluster.node_ids()
        );
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Cluster actor stopped");
    }
}

/// Propose a new value through a node
#[derive(Message)]
#[rtype(result = "Result<()>")]
pub struct ProposeState {
    pub node: NodeId,
    pub value: Vec<u8>,
}

/// Make a node start an election
#[derive(Message)]
#[rtype(result = "Result<()>")]
pub struct StartElection {
    pub node: NodeId,
}

/// Partition a node from the given targets
#[derive(Message)]
#[rtype(result = "Result<()>")]
pub struct SimulatePartition {
    pub node: NodeId,
    pub targets: Vec<NodeId>,
}

#[derive(Message)]
#[rtype(result = "Result<()>")]
pub struct SimulateFailure {
    pub node: NodeId,
}

#[derive(Message)]
#[rtype(result = "Result<()>")]
pub struct RecoverFromFailure {
    pub node: NodeId,
}

/// Fetch a node's activity log, newline separated
#[derive(Message)]
#[rtype(result = "Result<String>")]
pub struct GetActivityLog {
    pub node: NodeId,
}

/// Reset every node's activity log
#[derive(Message)]
#[rtype(result = "Result<()>")]
pub struct ClearActivityLogs;

#[derive(Message)]
#[rtype(result = "Result<NodeStatus>")]
pub struct GetNodeStatus {
    pub node: NodeId,
}

#[derive(Message)]
#[rtype(result = "Result<Vec<NodeStatus>>")]
pub struct GetClusterStatus;

/// Deliver all queued messages; returns how many were delivered
#[derive(Message)]
#[rtype(result = "Result<usize>")]
pub struct Flush;

impl Handler<ProposeState> for ClusterActor {
    type Result = Result<()>;

    fn handle(&mut self, msg: ProposeState, _ctx: &mut Context<Self>) -> Self::Result {
        self.cluster.propose_state(msg.node, msg.value)
    }
}

impl Handler<StartElection> for ClusterActor {
    type Result = Result<()>;

    fn handle(&mut self, msg: StartElection, _ctx: &mut Context<Self>) -> Self::Result {
        self.cluster.start_election(msg.node)
    }
}

impl Handler<SimulatePartition> for ClusterActor {
    type Result = Result<()>;

    fn handle(&mut self, msg: SimulatePartition, _ctx: &mut Context<Self>) -> Self::Result {
        self.cluster.simulate_partition(msg.node, &msg.targets)
    }
}

impl Handler<SimulateFailure> for ClusterActor {
    type Result = Result<()>;

    fn handle(&mut self, msg: SimulateFailure, _ctx: &mut Context<Self>) -> Self::Result {
        self.cluster.simulate_failure(msg.node)
    }
}

impl Handler<RecoverFromFailure> for ClusterActor {
    type Result = Result<()>;

    fn handle(&mut self, msg: RecoverFromFailure, _ctx: &mut Context<Self>) -> Self::Result {
        self.cluster.recover_from_failure(msg.node)
    }
}

impl Handler<GetActivityLog> for ClusterActor {
    type Result = Result<String>;

    fn handle(&mut self, msg: GetActivityLog, _ctx: &mut Context<Self>) -> Self::Result {
        self.cluster.retrieve_activity_log(msg.node)
    }
}

impl Handler<ClearActivityLogs> for ClusterActor {
    type Result = Result<()>;

    fn handle(&mut self, _msg: ClearActivityLogs, _ctx: &mut Context<Self>) -> Self::Result {
        self.cluster.clear_activity_logs();
        Ok(())
    }
}

impl Handler<GetNodeStatus> for ClusterActor {
    type Result = Result<NodeStatus>;

    fn handle(&mut self, msg: GetNodeStatus, _ctx: &mut Context<Self>) -> Self::Result {
        self.cluster.status(msg.node)
    }
}

impl Handler<GetClusterStatus> for ClusterActor {
    type Result = Result<Vec<NodeStatus>>;

    fn handle(&mut self, _msg: GetClusterStatus, _ctx: &mut Context<Self>) -> Self::Result {
        Ok(self.cluster.statuses())
    }
}

impl Handler<Flush> for ClusterActor {
    type Result = Result<usize>;

    fn handle(&mut self, _msg: Flush, _ctx: &mut Context<Self>) -> Self::Result {
        self.cluster.flush()
    }
}
