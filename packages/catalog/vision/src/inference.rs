//! Shared lifecycle of the vision nodes.
//!
//! A node starts loading its model as soon as it is created and reports
//! `loading model...`. Inputs that arrive before the model is ready are
//! rejected with [`NodeError::NotReady`]. Once loaded, inputs are processed one
//! at a time in arrival order; each one moves the status through
//! `infering...` and back to `ready` (or `error`). A failed load is terminal.
//!
//! What differs between node types (which model, how the result is shaped)
//! lives behind [`VisionVariant`].

use flow_vision::{
    NodeError,
    flow::{
        context::NodeContext,
        message::Message,
        node::{NodeLogic, NodeState},
    },
    utils::http::HttpFetch,
};
use flow_vision_catalog_core::{
    EffectiveParams, InferenceConfig, ModelProviders, ModelSource, NodeEnvironment,
    ParamDefaults, image::ImageInput, models::ModelLoader,
};
use flow_vision_types::{
    Value, async_trait, create_id,
    sync::{Mutex, OnceCell},
};
use std::{collections::BTreeMap, sync::Arc, time::Instant};

/// Result of one inference, merged into the outgoing message.
#[derive(Debug, Clone, Default)]
pub struct InferenceOutput {
    pub result: Value,
    pub shape: Vec<usize>,
    pub classes: Option<BTreeMap<String, usize>>,
    pub max_index: Option<usize>,
    /// Parameters written back onto the message, if the node echoes them
    pub echo: Option<EffectiveParams>,
}

impl InferenceOutput {
    /// The input message with its payload replaced by the result. Every other
    /// property of the message is kept.
    pub fn apply(self, mut message: Message) -> Message {
        message.set_result(self.result);
        message.shape = Some(self.shape);
        if self.classes.is_some() {
            message.classes = self.classes;
        }
        if self.max_index.is_some() {
            message.max_index = self.max_index;
        }
        if let Some(params) = self.echo {
            message.score_threshold = params.score_threshold;
            message.max_detections = params.max_detections;
        }
        message
    }
}

/// Behaviour of one vision node type.
pub trait VisionVariant: Send + Sync + 'static {
    type Model: Send + 'static;

    /// Source used when the node configuration names none.
    const DEFAULT_SOURCE: &'static str;

    const DEFAULTS: ParamDefaults;

    /// The backend able to load this node's model, if the host has one.
    fn loader(providers: &ModelProviders) -> Option<Arc<dyn ModelLoader<Self::Model>>>;

    /// Runs once on a freshly loaded model before the node reports ready.
    fn prepare(&self, _model: &mut Self::Model) -> flow_vision_types::Result<()> {
        Ok(())
    }

    /// Blocking. Decodes `image` and runs the model on it.
    fn infer(
        &self,
        model: &mut Self::Model,
        image: ImageInput,
        params: &EffectiveParams,
    ) -> Result<InferenceOutput, NodeError>;
}

/// A running vision node of variant `V`.
pub struct InferenceNode<V: VisionVariant> {
    inner: Arc<Inner<V>>,
}

struct Inner<V: VisionVariant> {
    ctx: NodeContext,
    config: InferenceConfig,
    source: ModelSource,
    variant: V,
    state: parking_lot::Mutex<NodeState>,
    /// Serializes status reports. Never held together with `state` while the
    /// host is called, so a host may read the node from inside a callback.
    reporting: parking_lot::ReentrantMutex<()>,
    model: OnceCell<Arc<Mutex<V::Model>>>,
}

impl<V: VisionVariant> InferenceNode<V> {
    /// Create the node and start loading its model in the background.
    pub fn spawn(
        node_type: &'static str,
        variant: V,
        env: &NodeEnvironment,
        config: &Value,
    ) -> Result<Arc<Self>, NodeError> {
        let config = InferenceConfig::from_json(config)?;
        let id = config.id.clone().unwrap_or_else(create_id);
        let ctx = NodeContext::new(id, node_type, env.host.clone()).with_name(config.name.clone());
        let source = ModelSource::parse(config.model_source().unwrap_or(V::DEFAULT_SOURCE));

        let inner = Arc::new(Inner {
            ctx,
            config,
            source,
            variant,
            state: parking_lot::Mutex::new(NodeState::Uninitialized),
            reporting: parking_lot::ReentrantMutex::new(()),
            model: OnceCell::new(),
        });

        inner.transition(NodeState::Loading);
        let loader = V::loader(&env.providers);
        let fetch = env.fetch.clone();
        tokio::spawn(inner.clone().load(loader, fetch));

        Ok(Arc::new(InferenceNode { inner }))
    }

    /// Where the model is loaded from.
    pub fn source(&self) -> &ModelSource {
        &self.inner.source
    }
}

impl<V: VisionVariant> Inner<V> {
    /// Move to `next` and report its status. Nothing leaves `Closed`, and a
    /// failed load only leaves towards `Closed`.
    fn transition(&self, next: NodeState) -> bool {
        let _reporting = self.reporting.lock();
        let status = {
            let mut state = self.state.lock();
            let allowed = match (&*state, &next) {
                (NodeState::Closed, _) => false,
                (NodeState::LoadFailed(_), NodeState::Closed) => true,
                (NodeState::LoadFailed(_), _) => false,
                _ => true,
            };
            if !allowed {
                tracing::trace!(
                    node_id = %self.ctx.id,
                    from = %*state,
                    to = %next,
                    "Ignoring state transition"
                );
                return false;
            }
            *state = next;
            state.status()
        };

        // Statuses leave in transition order, after the state lock is released.
        if let Some(status) = status {
            self.ctx.set_status(status);
        }
        true
    }

    fn ready_model(&self) -> Option<Arc<Mutex<V::Model>>> {
        if !self.state.lock().accepts_input() {
            return None;
        }
        self.model.get().cloned()
    }

    async fn load(
        self: Arc<Self>,
        loader: Option<Arc<dyn ModelLoader<V::Model>>>,
        fetch: Arc<dyn HttpFetch>,
    ) {
        let started = Instant::now();
        tracing::info!(
            node_id = %self.ctx.id,
            node_type = %self.ctx.node_type,
            source = %self.source,
            "Loading model"
        );

        let loaded = match loader {
            Some(loader) => loader
                .load(&self.source, fetch)
                .await
                .map_err(NodeError::model_load),
            None => Err(NodeError::ModelLoad(format!(
                "no model backend available for {}",
                self.ctx.node_type
            ))),
        };
        let prepared = match loaded {
            Ok(model) => self.clone().prepare(model).await,
            Err(err) => Err(err),
        };

        match prepared {
            Ok(model) => {
                if self.state.lock().is_terminal() {
                    tracing::debug!(node_id = %self.ctx.id, "Model loaded after close, discarding");
                    return;
                }
                if self.model.set(Arc::new(Mutex::new(model))).is_err() {
                    return;
                }
                if self.transition(NodeState::Ready) {
                    tracing::info!(
                        node_id = %self.ctx.id,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Model ready"
                    );
                }
            }
            Err(err) => {
                if self.transition(NodeState::LoadFailed(err.to_string())) {
                    self.ctx.report_error(&err, None);
                }
            }
        }
    }

    async fn prepare(self: Arc<Self>, model: V::Model) -> Result<V::Model, NodeError> {
        tokio::task::spawn_blocking(move || {
            let mut model = model;
            self.variant.prepare(&mut model).map(|_| model)
        })
        .await
        .map_err(|e| NodeError::ModelLoad(format!("model warm-up task failed: {e}")))?
        .map_err(NodeError::model_load)
    }

    /// Handle one input while holding the model, so status changes and the
    /// emitted message of one input never interleave with the next one.
    async fn process(self: Arc<Self>, model: Arc<Mutex<V::Model>>, message: Message) {
        // FIFO: one inference per node at a time, in arrival order.
        let guard = model.lock_owned().await;

        let image = match ImageInput::from_payload(&message.payload).await {
            Ok(image) => image,
            Err(err) => return self.fail(err, &message),
        };
        let params = EffectiveParams::resolve(&message, &self.config, V::DEFAULTS);
        if !self.transition(NodeState::Infering) {
            return self.ctx.report_error(&NodeError::NotReady, Some(&message));
        }

        let started = Instant::now();
        let inner = self.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let mut guard = guard;
            let output = inner.variant.infer(&mut *guard, image, &params);
            (guard, output)
        })
        .await;
        let (_guard, output) = match joined {
            Ok(done) => done,
            Err(e) => {
                let err = NodeError::Inference(format!("inference task failed: {e}"));
                return self.fail(err, &message);
            }
        };

        tracing::debug!(
            node_id = %self.ctx.id,
            msg_id = %message.id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = output.is_ok(),
            "Inference finished"
        );

        match output {
            Ok(output) => {
                if self.transition(NodeState::Ready) {
                    self.ctx.send(output.apply(message));
                }
            }
            Err(err) => self.fail(err, &message),
        }
    }

    fn fail(&self, err: NodeError, message: &Message) {
        self.transition(NodeState::Failed(err.to_string()));
        self.ctx.report_error(&err, Some(message));
    }
}

#[async_trait]
impl<V: VisionVariant> NodeLogic for InferenceNode<V> {
    fn id(&self) -> &str {
        &self.inner.ctx.id
    }

    fn node_type(&self) -> &str {
        &self.inner.ctx.node_type
    }

    fn state(&self) -> NodeState {
        self.inner.state.lock().clone()
    }

    async fn on_input(&self, message: Message) {
        let inner = &self.inner;
        let Some(model) = inner.ready_model() else {
            inner.ctx.report_error(&NodeError::NotReady, Some(&message));
            return;
        };

        inner.clone().process(model, message).await;
    }

    async fn on_close(&self) {
        if self.inner.transition(NodeState::Closed) {
            tracing::debug!(node_id = %self.inner.ctx.id, "Node closed");
        }
    }
}
