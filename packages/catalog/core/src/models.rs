//! Opaque model interfaces.
//!
//! The nodes never look inside a model: a backend loads it from a
//! [`ModelSource`] and exposes one of the traits below. Model calls are
//! blocking and run on a blocking worker thread; a node holds its model
//! exclusively, hence `&mut self`.

use crate::{ClassPrediction, DetectedObject, Pose, source::ModelSource};
use flow_vision::utils::http::HttpFetch;
use flow_vision_types::{async_trait, image::DynamicImage, ndarray::Array4};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Generic model taking a normalized `[1, h, w, c]` image tensor.
pub trait LayersModel: Send {
    /// `[1, height, width, channels]`
    fn input_shape(&self) -> [usize; 4];

    /// Flattened output vector.
    fn predict(&mut self, input: Array4<f32>) -> flow_vision_types::Result<Vec<f32>>;
}

pub trait ImageClassifier: Send {
    /// The `top_k` most likely classes, best first.
    fn classify(
        &mut self,
        image: &DynamicImage,
        top_k: usize,
    ) -> flow_vision_types::Result<Vec<ClassPrediction>>;
}

pub trait ObjectDetector: Send {
    fn detect(
        &mut self,
        image: &DynamicImage,
        max_detections: usize,
    ) -> flow_vision_types::Result<Vec<DetectedObject>>;
}

/// Options for multi-person pose estimation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PoseParams {
    pub flip_horizontal: bool,
    pub max_detections: usize,
    pub score_threshold: f32,
    /// Non-maximum suppression radius in pixels
    pub nms_radius: u32,
}

impl Default for PoseParams {
    fn default() -> Self {
        Self {
            flip_horizontal: false,
            max_detections: 4,
            score_threshold: 0.5,
            nms_radius: 20,
        }
    }
}

pub trait PoseEstimator: Send {
    fn estimate_multiple_poses(
        &mut self,
        image: &DynamicImage,
        params: &PoseParams,
    ) -> flow_vision_types::Result<Vec<Pose>>;
}

/// Loads a model of type `M`. Remote sources go through `fetch`.
#[async_trait]
pub trait ModelLoader<M>: Send + Sync {
    async fn load(
        &self,
        source: &ModelSource,
        fetch: Arc<dyn HttpFetch>,
    ) -> flow_vision_types::Result<M>;
}

pub type BoxedLayersModel = Box<dyn LayersModel>;
pub type BoxedClassifier = Box<dyn ImageClassifier>;
pub type BoxedDetector = Box<dyn ObjectDetector>;
pub type BoxedPoseEstimator = Box<dyn PoseEstimator>;

/// Backends available to the nodes of one host, one slot per model kind.
///
/// An empty slot is not an error until a node of that kind tries to load.
#[derive(Clone, Default)]
pub struct ModelProviders {
    pub layers: Option<Arc<dyn ModelLoader<BoxedLayersModel>>>,
    pub classifier: Option<Arc<dyn ModelLoader<BoxedClassifier>>>,
    pub detector: Option<Arc<dyn ModelLoader<BoxedDetector>>>,
    pub pose: Option<Arc<dyn ModelLoader<BoxedPoseEstimator>>>,
}

impl ModelProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layers(mut self, loader: Arc<dyn ModelLoader<BoxedLayersModel>>) -> Self {
        self.layers = Some(loader);
        self
    }

    pub fn with_classifier(mut self, loader: Arc<dyn ModelLoader<BoxedClassifier>>) -> Self {
        self.classifier = Some(loader);
        self
    }

    pub fn with_detector(mut self, loader: Arc<dyn ModelLoader<BoxedDetector>>) -> Self {
        self.detector = Some(loader);
        self
    }

    pub fn with_pose(mut self, loader: Arc<dyn ModelLoader<BoxedPoseEstimator>>) -> Self {
        self.pose = Some(loader);
        self
    }
}

impl std::fmt::Debug for ModelProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelProviders")
            .field("layers", &self.layers.is_some())
            .field("classifier", &self.classifier.is_some())
            .field("detector", &self.detector.is_some())
            .field("pose", &self.pose.is_some())
            .finish()
    }
}
