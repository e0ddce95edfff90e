use super::Scored;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Default, Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// A single keypoint in a pose skeleton
#[derive(Default, Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct Keypoint {
    /// Confidence score for this keypoint (0.0-1.0)
    pub score: f32,
    /// Body part name, see [`POSE_PART_NAMES`]
    pub part: String,
    /// Position in image space
    pub position: Position,
}

/// A complete pose (one person)
#[derive(Default, Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
pub struct Pose {
    /// Overall confidence score for the pose
    pub score: f32,
    /// All keypoints in this pose
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    /// Get keypoint by part name
    pub fn get_keypoint(&self, part: &str) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.part == part)
    }
}

impl Scored for Pose {
    fn score(&self) -> f32 {
        self.score
    }
}

/// Standard keypoint part names (17 keypoints)
pub const POSE_PART_NAMES: [&str; 17] = [
    "nose",
    "leftEye",
    "rightEye",
    "leftEar",
    "rightEar",
    "leftShoulder",
    "rightShoulder",
    "leftElbow",
    "rightElbow",
    "leftWrist",
    "rightWrist",
    "leftHip",
    "rightHip",
    "leftKnee",
    "rightKnee",
    "leftAnkle",
    "rightAnkle",
];
