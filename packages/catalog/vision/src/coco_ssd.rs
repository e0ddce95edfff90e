//! COCO-SSD object detection.

use crate::{
    NodeFactory, register_node,
    inference::{InferenceNode, InferenceOutput, VisionVariant},
};
use flow_vision::{NodeError, flow::node::NodeLogic};
use flow_vision_catalog_core::{
    EffectiveParams, ModelProviders, NodeEnvironment, ParamDefaults,
    filter::{retain_above_threshold, tally},
    image::{ImageInput, image_shape},
    models::{BoxedDetector, ModelLoader},
};
use flow_vision_types::{Value, json::to_value};
use std::sync::Arc;

/// Base network of the detector
pub const DEFAULT_MODEL: &str = "lite_mobilenet_v2";
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;
pub const DEFAULT_MAX_DETECTIONS: usize = 20;

/// Detects objects and emits their boxes, classes and scores.
///
/// The effective `scoreThreshold` and `maxDetections` are written back onto
/// the outgoing message.
#[register_node("tensorflowCocoSsd")]
#[derive(Debug, Default)]
pub struct CocoSsdNode {}

impl CocoSsdNode {
    pub fn new() -> Self {
        CocoSsdNode {}
    }
}

impl NodeFactory for CocoSsdNode {
    fn create(env: &NodeEnvironment, config: &Value) -> Result<Arc<dyn NodeLogic>, NodeError> {
        let node: Arc<dyn NodeLogic> =
            InferenceNode::spawn(Self::NODE_TYPE, CocoSsdNode::new(), env, config)?;
        Ok(node)
    }
}

impl VisionVariant for CocoSsdNode {
    type Model = BoxedDetector;

    const DEFAULT_SOURCE: &'static str = DEFAULT_MODEL;

    const DEFAULTS: ParamDefaults = ParamDefaults {
        score_threshold: Some(DEFAULT_SCORE_THRESHOLD),
        max_detections: Some(DEFAULT_MAX_DETECTIONS),
    };

    fn loader(providers: &ModelProviders) -> Option<Arc<dyn ModelLoader<Self::Model>>> {
        providers.detector.clone()
    }

    fn infer(
        &self,
        model: &mut Self::Model,
        image: ImageInput,
        params: &EffectiveParams,
    ) -> Result<InferenceOutput, NodeError> {
        let image = image.decode()?;
        let max_detections = params.max_detections.unwrap_or(DEFAULT_MAX_DETECTIONS);
        let threshold = params.score_threshold.unwrap_or(DEFAULT_SCORE_THRESHOLD);

        let mut objects = model
            .detect(&image, max_detections)
            .map_err(NodeError::inference)?;
        let dropped = retain_above_threshold(&mut objects, threshold);
        tracing::trace!(kept = objects.len(), dropped, threshold, "Filtered detections");

        Ok(InferenceOutput {
            classes: Some(tally(&objects)),
            result: to_value(&objects).map_err(NodeError::inference)?,
            shape: image_shape(&image),
            max_index: None,
            echo: Some(*params),
        })
    }
}
