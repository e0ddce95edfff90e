//! ImageNet classification with MobileNet.

use crate::{
    NodeFactory, register_node,
    inference::{InferenceNode, InferenceOutput, VisionVariant},
};
use flow_vision::{NodeError, flow::node::NodeLogic};
use flow_vision_catalog_core::{
    EffectiveParams, ModelProviders, NodeEnvironment, ParamDefaults,
    filter::{retain_above_threshold, tally},
    image::{ImageInput, image_shape},
    models::{BoxedClassifier, ModelLoader},
};
use flow_vision_types::{Value, json::to_value};
use std::sync::Arc;

pub const DEFAULT_MODEL: &str = "mobilenet_v2_1.0_224";
pub const DEFAULT_TOP_K: usize = 3;

#[register_node("tensorflowMobilenet")]
#[derive(Debug, Default)]
pub struct MobilenetNode {}

impl MobilenetNode {
    pub fn new() -> Self {
        MobilenetNode {}
    }
}

impl NodeFactory for MobilenetNode {
    fn create(env: &NodeEnvironment, config: &Value) -> Result<Arc<dyn NodeLogic>, NodeError> {
        let node: Arc<dyn NodeLogic> =
            InferenceNode::spawn(Self::NODE_TYPE, MobilenetNode::new(), env, config)?;
        Ok(node)
    }
}

impl VisionVariant for MobilenetNode {
    type Model = BoxedClassifier;

    const DEFAULT_SOURCE: &'static str = DEFAULT_MODEL;

    /// No threshold unless one is configured or requested.
    const DEFAULTS: ParamDefaults = ParamDefaults {
        score_threshold: None,
        max_detections: Some(DEFAULT_TOP_K),
    };

    fn loader(providers: &ModelProviders) -> Option<Arc<dyn ModelLoader<Self::Model>>> {
        providers.classifier.clone()
    }

    fn infer(
        &self,
        model: &mut Self::Model,
        image: ImageInput,
        params: &EffectiveParams,
    ) -> Result<InferenceOutput, NodeError> {
        let image = image.decode()?;
        let top_k = params.max_detections.unwrap_or(DEFAULT_TOP_K);

        let mut predictions = model
            .classify(&image, top_k)
            .map_err(NodeError::inference)?;
        if let Some(threshold) = params.score_threshold {
            let dropped = retain_above_threshold(&mut predictions, threshold);
            tracing::trace!(dropped, threshold, "Filtered classifications");
        }

        Ok(InferenceOutput {
            classes: Some(tally(&predictions)),
            result: to_value(&predictions).map_err(NodeError::inference)?,
            shape: image_shape(&image),
            max_index: None,
            echo: None,
        })
    }
}
