//! Core catalog types for Flow-Vision
//!
//! This crate contains what all vision node crates share:
//! - result types (ClassPrediction, DetectedObject, Pose)
//! - node configuration and effective parameter resolution
//! - threshold filtering, class tally and arg-max
//! - payload to image/tensor conversion
//! - the opaque model traits and their loaders
//! - NodeConstructor, NodeEnvironment and get_catalog()

use flow_vision::{
    NodeError,
    flow::{host::NodeHost, node::NodeLogic},
    utils::http::{HttpFetch, ReqwestFetch},
};
use flow_vision_types::Value;
use std::sync::Arc;

pub use flow_vision_catalog_macros::register_node;
pub use inventory;

pub mod config;
pub mod filter;
pub mod image;
pub mod models;
pub mod params;
pub mod source;
mod types;

pub use config::InferenceConfig;
pub use models::ModelProviders;
pub use params::{EffectiveParams, ParamDefaults};
pub use source::ModelSource;
pub use types::class_prediction::ClassPrediction;
pub use types::detected_object::DetectedObject;
pub use types::pose::{Keypoint, POSE_PART_NAMES, Pose, Position};
pub use types::{Labeled, Scored};

/// Collaborators injected into every node a host creates.
#[derive(Clone)]
pub struct NodeEnvironment {
    pub host: Arc<dyn NodeHost>,
    pub fetch: Arc<dyn HttpFetch>,
    pub providers: ModelProviders,
}

impl NodeEnvironment {
    /// Environment with the default `reqwest` fetcher and no model backends.
    pub fn new(host: Arc<dyn NodeHost>) -> Self {
        NodeEnvironment {
            host,
            fetch: Arc::new(ReqwestFetch::new()),
            providers: ModelProviders::default(),
        }
    }

    pub fn with_fetch(mut self, fetch: Arc<dyn HttpFetch>) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_providers(mut self, providers: ModelProviders) -> Self {
        self.providers = providers;
        self
    }
}

/// Builds a node from its environment and the host's raw configuration.
///
/// Must be called from within a Tokio runtime: model loading starts right away.
pub trait NodeFactory {
    fn create(env: &NodeEnvironment, config: &Value) -> Result<Arc<dyn NodeLogic>, NodeError>;
}

pub type NodeFactoryFn = fn(&NodeEnvironment, &Value) -> Result<Arc<dyn NodeLogic>, NodeError>;

/// A node type name bound to its factory
pub struct NodeConstructor {
    type_name: &'static str,
    constructor: NodeFactoryFn,
}

impl NodeConstructor {
    pub const fn new(type_name: &'static str, constructor: NodeFactoryFn) -> Self {
        Self {
            type_name,
            constructor,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn construct(
        &self,
        env: &NodeEnvironment,
        config: &Value,
    ) -> Result<Arc<dyn NodeLogic>, NodeError> {
        (self.constructor)(env, config)
    }
}

inventory::collect!(NodeConstructor);

/// Every registered node type, sorted by type name. Hosts bind these into
/// their own registry.
pub fn get_catalog() -> Vec<&'static NodeConstructor> {
    let mut catalog: Vec<&'static NodeConstructor> =
        inventory::iter::<NodeConstructor>.into_iter().collect();
    catalog.sort_by_key(|nc| nc.type_name());
    catalog
}

pub fn find_node(type_name: &str) -> Option<&'static NodeConstructor> {
    inventory::iter::<NodeConstructor>
        .into_iter()
        .find(|nc| nc.type_name() == type_name)
}
