use super::{host::NodeHost, message::Message, status::NodeStatus};
use crate::error::NodeError;
use std::sync::Arc;

/// Per-node handle on the host, tagged with the node's identity.
#[derive(Clone)]
pub struct NodeContext {
    pub id: String,
    pub node_type: String,
    pub name: Option<String>,
    host: Arc<dyn NodeHost>,
}

impl NodeContext {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>, host: Arc<dyn NodeHost>) -> Self {
        NodeContext {
            id: id.into(),
            node_type: node_type.into(),
            name: None,
            host,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn set_status(&self, status: NodeStatus) {
        tracing::debug!(
            node_id = %self.id,
            node_type = %self.node_type,
            status = %status,
            "Node status changed"
        );
        self.host.status(&self.id, &status);
    }

    pub fn report_error(&self, error: &NodeError, message: Option<&Message>) {
        if error.is_fatal() {
            tracing::error!(
                node_id = %self.id,
                node_type = %self.node_type,
                error = %error,
                "Node failed"
            );
        } else {
            tracing::warn!(
                node_id = %self.id,
                node_type = %self.node_type,
                msg_id = message.map(|m| m.id.as_str()).unwrap_or("-"),
                error = %error,
                "Dropping input"
            );
        }
        self.host.error(&self.id, error, message);
    }

    pub fn send(&self, message: Message) {
        tracing::trace!(node_id = %self.id, msg_id = %message.id, "Emitting message");
        self.host.send(&self.id, message);
    }
}

impl std::fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("id", &self.id)
            .field("node_type", &self.node_type)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
