//! Partition and crash injection for simulated clusters.

use crate::network::cluster::Cluster;
use crate::raft::types::NodeId;
use crate::util::errors::{RaftError, Result};

/// Fault injection against a set of nodes
pub trait FaultInjector {
    /// Cut the links between `node` and each of `targets`, in both directions
    fn simulate_partition(&mut self, node: NodeId, targets: &[NodeId]) -> Result<()>;

    /// Stop `node` from sending or receiving. Peer links are kept.
    fn simulate_failure(&mut self, node: NodeId) -> Result<()>;

    /// Bring `node` back with its term, role and log as they were
    fn recover_from_failure(&mut self, node: NodeId) -> Result<()>;
}

impl FaultInjector for Cluster {
    fn simulate_partition(&mut self, node: NodeId, targets: &[NodeId]) -> Result<()> {
        // Check everything first so a bad id leaves links untouched
        self.node_mut(node)?;
        if let Some(missing) = targets.iter().find(|t| self.node(**t).is_none()) {
            return Err(RaftError::UnknownNode(*missing));
        }

        for target in targets.iter().copied() {
            self.node_mut(node)?.remove_peer(target);
            self.node_mut(target)?.remove_peer(node);
        }

        let ids = targets
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        tracing::info!("Node {} partitioned from [{}]", node, ids);
        self.node_mut(node)?
            .record(format!("Simulated partition with nodes {}", ids));

        Ok(())
    }

    fn simulate_failure(&mut self, node: NodeId) -> Result<()> {
        let target = self.node_mut(node)?;
        target.deactivate();
        target.record(format!("Simulated failure of node {}", node));
        tracing::info!("Node {} failed", node);
        Ok(())
    }

    fn recover_from_failure(&mut self, node: NodeId) -> Result<()> {
        let target = self.node_mut(node)?;
        target.activate();
        target.record(format!("Node {} recovered from failure", node));
        tracing::info!(
            "Node {} recovered (term: {}, role: {})",
            node,
            target.term(),
            target.role()
        );
        Ok(())
    }
}
