//! Vision inference catalog for Flow-Vision
//!
//! This crate contains the image inference nodes:
//! - Generic layers model prediction (`tensorflowPredict`)
//! - Image classification (`tensorflowMobilenet`)
//! - Object detection (`tensorflowCocoSsd`)
//! - Pose estimation (`tensorflowPosenet`)

pub use flow_vision_catalog_core::{NodeConstructor, NodeFactory, inventory, register_node};
use flow_vision_catalog_core::ModelProviders;

pub mod coco_ssd;
pub mod inference;
pub mod mobilenet;
pub mod posenet;
pub mod predict;
#[cfg(feature = "execute")]
pub mod tract;

pub use coco_ssd::CocoSsdNode;
pub use mobilenet::MobilenetNode;
pub use posenet::PosenetNode;
pub use predict::PredictNode;

pub fn get_catalog() -> Vec<&'static NodeConstructor> {
    flow_vision_catalog_core::get_catalog()
}

/// Model backends compiled into this crate.
///
/// With `execute` this is the ONNX loader for the generic predictor, which
/// rejects any other source (including the default `model.json` URL).
pub fn default_providers() -> ModelProviders {
    #[allow(unused_mut)]
    let mut providers = ModelProviders::new();
    #[cfg(feature = "execute")]
    {
        providers = providers.with_layers(std::sync::Arc::new(tract::TractLayersLoader));
    }
    providers
}
