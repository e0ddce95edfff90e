use super::{message::Message, status::NodeStatus};
use flow_vision_types::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a vision node.
///
/// `Uninitialized -> Loading -> Ready`, or `Loading -> LoadFailed` which is
/// terminal for the instance. `Infering` and `Failed` are entered and left per
/// input; `Failed` still accepts the next input.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum NodeState {
    Uninitialized,
    Loading,
    Ready,
    Infering,
    Failed(String),
    LoadFailed(String),
    Closed,
}

impl NodeState {
    /// Whether an input arriving now may run inference.
    pub fn accepts_input(&self) -> bool {
        matches!(
            self,
            NodeState::Ready | NodeState::Infering | NodeState::Failed(_)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeState::LoadFailed(_) | NodeState::Closed)
    }

    /// Status signal the host shows while the node sits in this state.
    pub fn status(&self) -> Option<NodeStatus> {
        match self {
            NodeState::Uninitialized => None,
            NodeState::Loading => Some(NodeStatus::Loading),
            NodeState::Ready => Some(NodeStatus::Ready),
            NodeState::Infering => Some(NodeStatus::Infering),
            NodeState::Failed(_) => Some(NodeStatus::Error),
            NodeState::LoadFailed(_) => Some(NodeStatus::ModelError),
            NodeState::Closed => Some(NodeStatus::Closed),
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Uninitialized => write!(f, "Uninitialized"),
            NodeState::Loading => write!(f, "Loading"),
            NodeState::Ready => write!(f, "Ready"),
            NodeState::Infering => write!(f, "Infering"),
            NodeState::Failed(reason) => write!(f, "Failed: {}", reason),
            NodeState::LoadFailed(reason) => write!(f, "LoadFailed: {}", reason),
            NodeState::Closed => write!(f, "Closed"),
        }
    }
}

/// A running node instance as the host sees it.
#[async_trait]
pub trait NodeLogic: Send + Sync {
    fn id(&self) -> &str;

    /// Registered type name, e.g. `tensorflowCocoSsd`
    fn node_type(&self) -> &str;

    fn state(&self) -> NodeState;

    /// Handle one inbound message. Results leave through the host, never
    /// through the return value.
    async fn on_input(&self, message: Message);

    async fn on_close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_loaded_states_accept_input() {
        assert!(!NodeState::Uninitialized.accepts_input());
        assert!(!NodeState::Loading.accepts_input());
        assert!(NodeState::Ready.accepts_input());
        assert!(NodeState::Infering.accepts_input());
        assert!(NodeState::Failed("boom".into()).accepts_input());
        assert!(!NodeState::LoadFailed("404".into()).accepts_input());
        assert!(!NodeState::Closed.accepts_input());
    }

    #[test]
    fn states_map_to_status() {
        assert_eq!(NodeState::Uninitialized.status(), None);
        assert_eq!(
            NodeState::LoadFailed("x".into()).status(),
            Some(NodeStatus::ModelError)
        );
        assert_eq!(NodeState::Failed("x".into()).status(), Some(NodeStatus::Error));
        assert!(NodeState::Closed.is_terminal());
        assert!(!NodeState::Failed("x".into()).is_terminal());
    }
}
