//! ONNX backend for the generic predictor, built on `tract`.

use flow_vision::utils::http::HttpFetch;
use flow_vision_catalog_core::{
    ModelSource,
    models::{BoxedLayersModel, LayersModel, ModelLoader},
};
use flow_vision_types::{async_trait, ndarray::Array4};
use std::{io::Cursor, sync::Arc};
use tract_onnx::prelude::*;
use tract_onnx::tract_hir::internal::DimLike;

/// Loads `.onnx` image models taking a single `[N, h, w, c]` f32 input.
#[derive(Debug, Default, Clone, Copy)]
pub struct TractLayersLoader;

#[async_trait]
impl ModelLoader<BoxedLayersModel> for TractLayersLoader {
    async fn load(
        &self,
        source: &ModelSource,
        fetch: Arc<dyn HttpFetch>,
    ) -> flow_vision_types::Result<BoxedLayersModel> {
        ensure_onnx(source)?;
        let bytes = source.read_bytes(fetch.as_ref()).await?;
        let model = tokio::task::spawn_blocking(move || TractLayersModel::from_bytes(&bytes))
            .await
            .map_err(|e| flow_vision_types::anyhow!("ONNX load task join error: {}", e))??;
        Ok(Box::new(model))
    }
}

/// Only ONNX graphs can be parsed here. TensorFlow.js `model.json` layers
/// models have to be converted first.
fn ensure_onnx(source: &ModelSource) -> flow_vision_types::Result<()> {
    match source.extension().as_deref() {
        Some("onnx") => Ok(()),
        _ => flow_vision_types::bail!(
            "the bundled backend loads ONNX models only, got '{}'",
            source
        ),
    }
}

pub struct TractLayersModel {
    plan: TypedRunnableModel<TypedModel>,
    input_shape: [usize; 4],
}

impl TractLayersModel {
    pub fn from_bytes(bytes: &[u8]) -> flow_vision_types::Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut Cursor::new(bytes))
            .map_err(|e| flow_vision_types::anyhow!("ONNX parse error: {e}"))?;

        let typed = model.clone().into_typed()?;
        let inlet = typed.input_outlets()?[0];
        let dims: Vec<TDim> = typed.outlet_fact(inlet)?.shape.iter().cloned().collect();
        if dims.len() != 4 {
            flow_vision_types::bail!("expected a 4-d image input, got {} dims", dims.len());
        }
        // A symbolic batch dimension is pinned to 1.
        let input_shape = [
            1,
            dims[1].to_usize()?,
            dims[2].to_usize()?,
            dims[3].to_usize()?,
        ];

        let plan = model
            .with_input_fact(0, f32::fact(input_shape).into())?
            .into_optimized()?
            .into_runnable()?;

        Ok(TractLayersModel { plan, input_shape })
    }
}

impl LayersModel for TractLayersModel {
    fn input_shape(&self) -> [usize; 4] {
        self.input_shape
    }

    fn predict(&mut self, input: Array4<f32>) -> flow_vision_types::Result<Vec<f32>> {
        let data = input
            .as_slice()
            .ok_or_else(|| flow_vision_types::anyhow!("input tensor is not contiguous"))?;
        let tensor = Tensor::from_shape(&self.input_shape, data)?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| flow_vision_types::anyhow!("Failed to run ONNX model: {e}"))?;
        let output = outputs
            .first()
            .ok_or_else(|| flow_vision_types::anyhow!("Model produced no outputs"))?;

        Ok(output.as_slice::<f32>()?.to_vec())
    }
}
