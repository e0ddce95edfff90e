use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFill {
    Red,
    Green,
    Yellow,
    Blue,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusShape {
    Ring,
    Dot,
}

/// Status signal shown by the host next to a node.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeStatus {
    Loading,
    Ready,
    Infering,
    /// Inference failed; the node still accepts input.
    Error,
    /// Model load failed; the node stays unready.
    ModelError,
    /// Cleared on shutdown.
    Closed,
}

/// Wire shape of a status as the host UI consumes it.
///
/// A closed node serializes to `{}`.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusDisplay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<StatusFill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<StatusShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl NodeStatus {
    pub fn fill(&self) -> Option<StatusFill> {
        match self {
            Self::Loading => Some(StatusFill::Yellow),
            Self::Ready => Some(StatusFill::Green),
            Self::Infering => Some(StatusFill::Blue),
            Self::Error | Self::ModelError => Some(StatusFill::Red),
            Self::Closed => None,
        }
    }

    pub fn shape(&self) -> Option<StatusShape> {
        match self {
            Self::Loading | Self::Infering => Some(StatusShape::Ring),
            Self::Ready | Self::Error | Self::ModelError => Some(StatusShape::Dot),
            Self::Closed => None,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Self::Loading => "loading model...",
            Self::Ready => "ready",
            Self::Infering => "infering...",
            Self::Error => "error",
            Self::ModelError => "model error",
            Self::Closed => "",
        }
    }

    pub fn display(&self) -> StatusDisplay {
        if *self == Self::Closed {
            return StatusDisplay::default();
        }

        StatusDisplay {
            fill: self.fill(),
            shape: self.shape(),
            text: Some(self.text().to_string()),
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            other => write!(f, "{}", other.text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_vision_types::json::{json, to_value};

    #[test]
    fn status_colors_match_host_convention() {
        assert_eq!(NodeStatus::Loading.fill(), Some(StatusFill::Yellow));
        assert_eq!(NodeStatus::Loading.shape(), Some(StatusShape::Ring));
        assert_eq!(NodeStatus::Ready.fill(), Some(StatusFill::Green));
        assert_eq!(NodeStatus::Ready.shape(), Some(StatusShape::Dot));
        assert_eq!(NodeStatus::Infering.fill(), Some(StatusFill::Blue));
        assert_eq!(NodeStatus::Infering.shape(), Some(StatusShape::Ring));
        assert_eq!(NodeStatus::Error.fill(), Some(StatusFill::Red));
        assert_eq!(NodeStatus::ModelError.text(), "model error");
    }

    #[test]
    fn closed_status_is_cleared() {
        let display = to_value(NodeStatus::Closed.display()).unwrap();
        assert_eq!(display, json!({}));
    }

    #[test]
    fn ready_status_display() {
        let display = to_value(NodeStatus::Ready.display()).unwrap();
        assert_eq!(
            display,
            json!({"fill": "green", "shape": "dot", "text": "ready"})
        );
    }
}
