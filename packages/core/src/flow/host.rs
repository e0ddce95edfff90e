use super::{message::Message, status::NodeStatus};
use crate::error::NodeError;
use flow_vision_types::sync::mpsc;

/// What a node needs from the flow runtime hosting it.
///
/// The runtime owns routing and UI; a node only reports status, reports errors
/// (with the triggering message, when there is one) and emits messages.
pub trait NodeHost: Send + Sync {
    fn status(&self, node_id: &str, status: &NodeStatus);

    fn error(&self, node_id: &str, error: &NodeError, message: Option<&Message>);

    fn send(&self, node_id: &str, message: Message);
}

#[derive(Debug, Clone)]
pub enum HostEvent {
    Status {
        node_id: String,
        status: NodeStatus,
    },
    Error {
        node_id: String,
        error: NodeError,
        message: Option<Message>,
    },
    Send {
        node_id: String,
        message: Message,
    },
}

impl HostEvent {
    pub fn node_id(&self) -> &str {
        match self {
            HostEvent::Status { node_id, .. }
            | HostEvent::Error { node_id, .. }
            | HostEvent::Send { node_id, .. } => node_id,
        }
    }
}

/// Host adapter that forwards every call as a [`HostEvent`] over a channel.
///
/// Events of one node arrive in the order the node produced them.
#[derive(Clone)]
pub struct ChannelHost {
    sender: mpsc::UnboundedSender<HostEvent>,
}

impl ChannelHost {
    pub fn new() -> (ChannelHost, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelHost { sender: tx }, rx)
    }

    fn forward(&self, event: HostEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Host event receiver dropped, discarding event");
        }
    }
}

impl NodeHost for ChannelHost {
    fn status(&self, node_id: &str, status: &NodeStatus) {
        self.forward(HostEvent::Status {
            node_id: node_id.to_string(),
            status: status.clone(),
        });
    }

    fn error(&self, node_id: &str, error: &NodeError, message: Option<&Message>) {
        self.forward(HostEvent::Error {
            node_id: node_id.to_string(),
            error: error.clone(),
            message: message.cloned(),
        });
    }

    fn send(&self, node_id: &str, message: Message) {
        self.forward(HostEvent::Send {
            node_id: node_id.to_string(),
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_host_preserves_order() {
        let (host, mut rx) = ChannelHost::new();
        host.status("n1", &NodeStatus::Loading);
        host.error("n1", &NodeError::NotReady, None);
        host.send("n1", Message::default());

        assert!(matches!(
            rx.try_recv().unwrap(),
            HostEvent::Status { status: NodeStatus::Loading, .. }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            HostEvent::Error { error: NodeError::NotReady, .. }
        ));
        let last = rx.try_recv().unwrap();
        assert_eq!(last.node_id(), "n1");
        assert!(matches!(last, HostEvent::Send { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_is_not_fatal() {
        let (host, rx) = ChannelHost::new();
        drop(rx);
        host.status("n1", &NodeStatus::Ready);
    }
}
