use crate::raft::types::NodeId;

/// Sink for a node's human-readable activity events.
///
/// Implementations must keep events in insertion order and store them
/// untransformed.
pub trait ActivityRecorder: Send {
    /// Append one event
    fn record(&mut self, event: String);

    /// All recorded events, oldest first
    fn events(&self) -> Vec<String>;

    /// Drop every recorded event
    fn clear(&mut self);

    /// All events joined by newlines
    fn retrieve(&self) -> String {
        self.events().join("\n")
    }
}

/// Default in-memory recorder. Every event is also emitted to `tracing`.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    node_id: NodeId,
    events: Vec<String>,
}

impl ActivityLog {
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            events: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl ActivityRecorder for ActivityLog {
    fn record(&mut self, event: String) {
        tracing::debug!(node = self.node_id, "{}", event);
        self.events.push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.clone()
    }

    fn clear(&mut self) {
        self.events.clear();
    }
}
