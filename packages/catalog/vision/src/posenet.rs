//! Multi-person pose estimation with PoseNet.

use crate::{
    NodeFactory, register_node,
    inference::{InferenceNode, InferenceOutput, VisionVariant},
};
use flow_vision::{NodeError, flow::node::NodeLogic};
use flow_vision_catalog_core::{
    EffectiveParams, ModelProviders, NodeEnvironment, ParamDefaults,
    filter::retain_above_threshold,
    image::{ImageInput, image_shape},
    models::{BoxedPoseEstimator, ModelLoader, PoseParams},
};
use flow_vision_types::{Value, json::to_value};
use std::{collections::BTreeMap, sync::Arc};

pub const DEFAULT_MODEL: &str = "posenet_mobilenet_v1_075";
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;
pub const DEFAULT_MAX_DETECTIONS: usize = 4;

/// Estimates the poses of up to `maxDetections` people.
///
/// `classes` always holds a single `person` count, zero included.
#[register_node("tensorflowPosenet")]
#[derive(Debug, Default)]
pub struct PosenetNode {}

impl PosenetNode {
    pub fn new() -> Self {
        PosenetNode {}
    }
}

impl NodeFactory for PosenetNode {
    fn create(env: &NodeEnvironment, config: &Value) -> Result<Arc<dyn NodeLogic>, NodeError> {
        let node: Arc<dyn NodeLogic> =
            InferenceNode::spawn(Self::NODE_TYPE, PosenetNode::new(), env, config)?;
        Ok(node)
    }
}

impl VisionVariant for PosenetNode {
    type Model = BoxedPoseEstimator;

    const DEFAULT_SOURCE: &'static str = DEFAULT_MODEL;

    const DEFAULTS: ParamDefaults = ParamDefaults {
        score_threshold: Some(DEFAULT_SCORE_THRESHOLD),
        max_detections: Some(DEFAULT_MAX_DETECTIONS),
    };

    fn loader(providers: &ModelProviders) -> Option<Arc<dyn ModelLoader<Self::Model>>> {
        providers.pose.clone()
    }

    fn infer(
        &self,
        model: &mut Self::Model,
        image: ImageInput,
        params: &EffectiveParams,
    ) -> Result<InferenceOutput, NodeError> {
        let image = image.decode()?;
        let pose_params = PoseParams {
            max_detections: params.max_detections.unwrap_or(DEFAULT_MAX_DETECTIONS),
            score_threshold: params.score_threshold.unwrap_or(DEFAULT_SCORE_THRESHOLD),
            ..PoseParams::default()
        };

        let mut poses = model
            .estimate_multiple_poses(&image, &pose_params)
            .map_err(NodeError::inference)?;
        retain_above_threshold(&mut poses, pose_params.score_threshold);

        let classes = BTreeMap::from([("person".to_string(), poses.len())]);
        Ok(InferenceOutput {
            classes: Some(classes),
            result: to_value(&poses).map_err(NodeError::inference)?,
            shape: image_shape(&image),
            max_index: None,
            echo: Some(*params),
        })
    }
}
