//! Generic layers model: raw output vector plus its arg-max.

use crate::{
    NodeFactory, register_node,
    inference::{InferenceNode, InferenceOutput, VisionVariant},
};
use flow_vision::{NodeError, flow::node::NodeLogic};
use flow_vision_catalog_core::{
    EffectiveParams, ModelProviders, NodeEnvironment, ParamDefaults,
    filter::arg_max,
    image::{ImageInput, to_input_tensor},
    models::{BoxedLayersModel, ModelLoader},
};
use flow_vision_types::{Value, json::to_value, ndarray::Array4};
use std::sync::Arc;

/// TensorFlow.js layers model used when no source is configured. The bundled
/// `execute` backend reads ONNX only, so with it a predictor needs an explicit
/// `.onnx` source; hosts with a layers backend of their own can use this one.
pub const DEFAULT_MODEL_URL: &str =
    "https://storage.googleapis.com/tfjs-models/tfjs/mobilenet_v1_0.25_224/model.json";

/// Runs a layers model on the image and emits the flat output vector.
///
/// The image is converted to the channel depth of the model input, resized to
/// its height and width and normalized to `[-1, 1]`. No thresholding.
#[register_node("tensorflowPredict")]
#[derive(Debug, Default)]
pub struct PredictNode {}

impl PredictNode {
    pub fn new() -> Self {
        PredictNode {}
    }
}

impl NodeFactory for PredictNode {
    fn create(env: &NodeEnvironment, config: &Value) -> Result<Arc<dyn NodeLogic>, NodeError> {
        let node: Arc<dyn NodeLogic> =
            InferenceNode::spawn(Self::NODE_TYPE, PredictNode::new(), env, config)?;
        Ok(node)
    }
}

impl VisionVariant for PredictNode {
    type Model = BoxedLayersModel;

    const DEFAULT_SOURCE: &'static str = DEFAULT_MODEL_URL;

    const DEFAULTS: ParamDefaults = ParamDefaults {
        score_threshold: None,
        max_detections: None,
    };

    fn loader(providers: &ModelProviders) -> Option<Arc<dyn ModelLoader<Self::Model>>> {
        providers.layers.clone()
    }

    /// One pass on a zero tensor so the first real input does not pay for
    /// kernel setup.
    fn prepare(&self, model: &mut Self::Model) -> flow_vision_types::Result<()> {
        let shape = model.input_shape();
        if shape[0] != 1 {
            flow_vision_types::bail!("unsupported model input shape {:?}", shape);
        }
        model.predict(Array4::zeros(shape))?;
        Ok(())
    }

    fn infer(
        &self,
        model: &mut Self::Model,
        image: ImageInput,
        _params: &EffectiveParams,
    ) -> Result<InferenceOutput, NodeError> {
        let shape = model.input_shape();
        let image = image.decode()?;
        let tensor = to_input_tensor(&image, shape)?;

        let output = model.predict(tensor).map_err(NodeError::inference)?;
        let max_index = arg_max(&output);

        Ok(InferenceOutput {
            result: to_value(&output).map_err(NodeError::inference)?,
            shape: shape.to_vec(),
            classes: None,
            max_index,
            echo: None,
        })
    }
}
