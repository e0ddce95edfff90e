use super::{Labeled, Scored};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One object found by a detector.
///
/// `bbox` is `[x, y, width, height]` in pixels of the input image, origin at
/// the top-left corner.
#[derive(Default, Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct DetectedObject {
    pub bbox: [f32; 4],
    pub class: String,
    pub score: f32,
}

impl DetectedObject {
    pub fn new(class: impl Into<String>, score: f32, bbox: [f32; 4]) -> Self {
        Self {
            bbox,
            class: class.into(),
            score,
        }
    }
}

impl Scored for DetectedObject {
    fn score(&self) -> f32 {
        self.score
    }
}

impl Labeled for DetectedObject {
    fn label(&self) -> String {
        self.class.clone()
    }
}
