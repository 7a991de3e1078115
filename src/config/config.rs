use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::network::transport::DeliveryMode;
use crate::raft::types::NodeId;
use crate::util::errors::{RaftError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Identifiers of the simulated nodes
    #[serde(default = "default_node_ids")]
    pub node_ids: Vec<NodeId>,

    /// Peer every node with every other node at startup
    #[serde(default = "default_full_mesh")]
    pub full_mesh: bool,

    /// Immediate (synchronous cascade) or queued (deliver on flush)
    #[serde(default)]
    pub delivery: DeliveryMode,
}

impl ClusterConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.node_ids.is_empty() {
            return Err("node_ids cannot be empty".to_string());
        }

        let mut seen = HashSet::new();
        for id in &self.node_ids {
            if !seen.insert(id) {
                return Err(format!("duplicate node id {}", id));
            }
        }

        Ok(())
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            node_ids: default_node_ids(),
            full_mesh: default_full_mesh(),
            delivery: DeliveryMode::default(),
        }
    }
}

fn default_node_ids() -> Vec<NodeId> {
    vec![1, 2, 3]
}

fn default_full_mesh() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Max tracing level: trace, debug, info, warn or error
    #[serde(default = "default_level")]
    pub level: String,
}

impl LogConfig {
    pub fn max_level(&self) -> std::result::Result<tracing::Level, String> {
        self.level
            .parse()
            .map_err(|_| format!("unknown log level '{}'", self.level))
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.cluster.validate().map_err(RaftError::InvalidConfig)?;
        self.log.max_level().map_err(RaftError::InvalidConfig)?;
        Ok(())
    }
}
