#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::decode::ModelOutput;
use crate::frame::{Frame, Roi};

use super::backend::{InferenceBackend, OutputDims};

/// Tract-based backend for ONNX FOMO models.
///
/// Loads a local model artifact and runs inference on frame ROIs. The model
/// is expected to take a [1,3,H,W] float input and emit a [1,oh,ow,oc]
/// heat-map tensor with per-cell class confidences.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_width: u32,
    input_height: u32,
    dims: OutputDims,
}

impl TractBackend {
    /// Load an ONNX model from disk and probe its output grid shape.
    ///
    /// A missing or corrupt artifact fails here, before the frame loop
    /// starts.
    pub fn new<P: AsRef<Path>>(model_path: P, input_width: u32, input_height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| {
                format!(
                    "failed to load model artifact {} (was it copied onto the device?)",
                    model_path.display()
                )
            })?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_height as usize, input_width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        let dims = probe_output_dims(&model, input_width, input_height)?;
        log::info!(
            "tract backend ready: input {}x{}, output grid {}x{}x{}",
            input_width,
            input_height,
            dims.width,
            dims.height,
            dims.channels
        );

        Ok(Self {
            model,
            input_width,
            input_height,
            dims,
        })
    }

    fn build_input(&self, frame: &Frame, roi: Roi) -> Result<Tensor> {
        if roi.width != self.input_width || roi.height != self.input_height {
            return Err(anyhow!(
                "roi {}x{} does not match model input {}x{}",
                roi.width,
                roi.height,
                self.input_width,
                self.input_height
            ));
        }
        if !roi.fits(frame.width, frame.height) {
            return Err(anyhow!(
                "roi ({},{}) {}x{} exceeds frame {}x{}",
                roi.x,
                roi.y,
                roi.width,
                roi.height,
                frame.width,
                frame.height
            ));
        }

        let stride = frame.width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, roi.height as usize, roi.width as usize),
            |(_, channel, y, x)| {
                let fy = roi.y as usize + y;
                let fx = roi.x as usize + x;
                let idx = (fy * stride + fx) * 3 + channel;
                frame.data[idx] as f32 / 255.0
            },
        );
        Ok(input.into_tensor())
    }
}

impl InferenceBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn output_dims(&self) -> OutputDims {
        self.dims
    }

    fn infer(&mut self, frame: &Frame, roi: Roi) -> Result<ModelOutput> {
        let input = self.build_input(frame, roi)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        tensor_to_heatmap(&outputs, self.dims)
    }

    fn warm_up(&mut self) -> Result<()> {
        let zeros =
            Tensor::zero::<f32>(&[1, 3, self.input_height as usize, self.input_width as usize])?;
        self.model.run(tvec!(zeros.into())).context("warm-up inference failed")?;
        Ok(())
    }
}

fn probe_output_dims(
    model: &SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_width: u32,
    input_height: u32,
) -> Result<OutputDims> {
    let zeros = Tensor::zero::<f32>(&[1, 3, input_height as usize, input_width as usize])?;
    let outputs = model
        .run(tvec!(zeros.into()))
        .context("probe inference failed")?;
    let output = outputs
        .first()
        .ok_or_else(|| anyhow!("model produced no outputs"))?;
    let shape = output.shape();
    if shape.len() != 4 || shape[0] != 1 {
        return Err(anyhow!(
            "expected heat-map output shape [1,h,w,c], model emits {:?}",
            shape
        ));
    }
    Ok(OutputDims {
        height: shape[1],
        width: shape[2],
        channels: shape[3],
    })
}

fn tensor_to_heatmap(outputs: &TVec<TValue>, dims: OutputDims) -> Result<ModelOutput> {
    let output = outputs
        .first()
        .ok_or_else(|| anyhow!("model produced no outputs"))?;
    let view = output
        .to_array_view::<f32>()
        .context("model output tensor was not f32")?;
    let shape = view.shape();
    if shape != [1, dims.height, dims.width, dims.channels] {
        return Err(anyhow!(
            "model output shape {:?} changed mid-run, expected [1,{},{},{}]",
            shape,
            dims.height,
            dims.width,
            dims.channels
        ));
    }
    // [1,h,w,c] in standard layout iterates in NHWC order.
    let scores: Vec<f32> = view.iter().copied().collect();
    ModelOutput::from_nhwc(dims.height, dims.width, dims.channels, scores)
}
