use actix::prelude::*;
use anyhow::{bail, Context as _};
use raft_sim::{
    config::Config,
    consensus::actor::{
        ClearActivityLogs, ClusterActor, Flush, GetActivityLog, GetClusterStatus, ProposeState,
        RecoverFromFailure, SimulateFailure, SimulatePartition, StartElection,
    },
    network::Cluster,
    raft::NodeId,
};

#[actix_rt::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = match parse_config_arg(&args) {
        Some(path) => Config::load(&path).with_context(|| format!("loading {}", path))?,
        None => Config::default(),
    };

    let level = config.log.max_level().map_err(anyhow::Error::msg)?;
    tracing_subscriber::fmt().with_max_level(level).init();

    if config.cluster.node_ids.len() < 3 {
        bail!("the demo needs at least three nodes");
    }
    let ids = [
        config.cluster.node_ids[0],
        config.cluster.node_ids[1],
        config.cluster.node_ids[2],
    ];

    let cluster = Cluster::from_config(&config.cluster)?;
    let addr = ClusterActor::new(cluster).start();

    tracing::info!("Running scenarios on nodes {:?}", ids);
    run_scenarios(&addr, ids).await?;

    let statuses = addr.send(GetClusterStatus).await??;
    println!("\nFinal cluster status:");
    println!("{}", serde_json::to_string_pretty(&statuses)?);

    Ok(())
}

fn parse_config_arg(args: &[String]) -> Option<String> {
    args.iter()
        .skip(1)
        .find_map(|arg| arg.strip_prefix("--config="))
        .filter(|path| !path.is_empty())
        .map(str::to_string)
}

async fn run_scenarios(addr: &Addr<ClusterActor>, ids: [NodeId; 3]) -> anyhow::Result<()> {
    let [n1, n2, n3] = ids;

    println!("Scenario 1: Successful Consensus");
    for node in ids {
        addr.send(StartElection { node }).await??;
        addr.send(Flush).await??;
    }
    propose(addr, n1, "State A").await?;
    print_logs(addr, ids).await?;

    println!("\nScenario 2: Network Partition");
    addr.send(SimulatePartition {
        node: n3,
        targets: vec![n1],
    })
    .await??;
    propose(addr, n2, "State B").await?;
    print_logs(addr, ids).await?;

    println!("\nScenario 3: Node Failure and Recovery");
    addr.send(SimulateFailure { node: n1 }).await??;
    propose(addr, n2, "State C").await?;
    addr.send(RecoverFromFailure { node: n1 }).await??;
    propose(addr, n1, "State D").await?;
    print_logs(addr, ids).await?;

    println!("\nScenario 4: Multiple Nodes Proposing New States");
    propose(addr, n1, "State E").await?;
    propose(addr, n2, "State F").await?;
    propose(addr, n3, "State G").await?;
    print_logs(addr, ids).await?;

    Ok(())
}

async fn propose(addr: &Addr<ClusterActor>, node: NodeId, value: &str) -> anyhow::Result<()> {
    addr.send(ProposeState {
        node,
        value: value.as_bytes().to_vec(),
    })
    .await??;
    addr.send(Flush).await??;
    Ok(())
}

/// Print each node's activity, then reset it for the next scenario
async fn print_logs(addr: &Addr<ClusterActor>, ids: [NodeId; 3]) -> anyhow::Result<()> {
    for node in ids {
        let log = addr.send(GetActivityLog { node }).await??;
        println!("--- Node {} ---", node);
        if !log.is_empty() {
            println!("{}", log);
        }
    }
    addr.send(ClearActivityLogs).await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_arg() {
        let args = vec!["raft-sim".to_string(), "--config=sim.json".to_string()];
        assert_eq!(parse_config_arg(&args), Some("sim.json".to_string()));

        let args = vec!["raft-sim".to_string(), "--config=".to_string()];
        assert_eq!(parse_config_arg(&args), None);

        let args = vec!["raft-sim".to_string()];
        assert_eq!(parse_config_arg(&args), None);
    }
}
