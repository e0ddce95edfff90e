use super::{Labeled, Scored};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Classification prediction result from ML models
///
/// Serialized as `{classIdx, probability, className}`, the shape flows built
/// around the MobileNet node read. The snake_case names are accepted on input.
#[derive(Default, Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct ClassPrediction {
    /// Class index (0-based)
    #[serde(rename = "classIdx", alias = "class_idx")]
    pub class_idx: u32,
    /// Confidence score (typically 0.0-1.0)
    #[serde(rename = "probability", alias = "score")]
    pub score: f32,
    /// Optional human-readable class label
    #[serde(rename = "className", alias = "label", default)]
    pub label: Option<String>,
}

impl ClassPrediction {
    /// Create a new prediction with just class index and score
    pub fn new(class_idx: u32, score: f32) -> Self {
        Self {
            class_idx,
            score,
            label: None,
        }
    }

    /// Create a new prediction with label
    pub fn with_label(class_idx: u32, score: f32, label: impl Into<String>) -> Self {
        Self {
            class_idx,
            score,
            label: Some(label.into()),
        }
    }
}

impl Scored for ClassPrediction {
    fn score(&self) -> f32 {
        self.score
    }
}

impl Labeled for ClassPrediction {
    /// Unlabeled predictions are counted under their class index.
    fn label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.class_idx.to_string())
    }
}
