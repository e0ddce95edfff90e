use thiserror::Error;

/// Errors surfaced by a node on the host's error channel.
///
/// They never cross the node boundary as a panic or a returned error; the node
/// reports them and keeps running. Each variant only carries a readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// Model fetch or parse failure. Fatal for the node instance.
    #[error("model error: {0}")]
    ModelLoad(String),

    /// Input arrived before the model finished loading (or after close).
    #[error("model is not ready")]
    NotReady,

    /// Unreadable file or malformed image.
    #[error("could not decode image: {0}")]
    Decode(String),

    /// The model call itself failed.
    #[error("inference failed: {0}")]
    Inference(String),

    /// Node configuration could not be parsed.
    #[error("invalid node configuration: {0}")]
    Config(String),
}

impl NodeError {
    pub fn model_load(err: impl std::fmt::Display) -> Self {
        Self::ModelLoad(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    pub fn inference(err: impl std::fmt::Display) -> Self {
        Self::Inference(err.to_string())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ModelLoad(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(NodeError::NotReady.to_string(), "model is not ready");
        assert_eq!(
            NodeError::model_load("404 Not Found").to_string(),
            "model error: 404 Not Found"
        );
    }

    #[test]
    fn only_load_errors_are_fatal() {
        assert!(NodeError::model_load("x").is_fatal());
        assert!(!NodeError::decode("x").is_fatal());
        assert!(!NodeError::inference("x").is_fatal());
        assert!(!NodeError::NotReady.is_fatal());
    }
}
