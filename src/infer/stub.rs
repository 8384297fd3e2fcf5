use anyhow::Result;

use crate::decode::ModelOutput;
use crate::frame::{Frame, Roi};

use super::backend::{InferenceBackend, OutputDims};

const STUB_GRID: usize = 30;
const HOT_BLOCK: usize = 3;
const HOT_SCORE: f32 = 0.9;

/// Stub backend for testing and model-less bring-up.
///
/// Emits a hot 3x3 block in channel 1, centered in the grid, whenever the
/// mean luminance of the ROI crosses a fixed brightness threshold. Channel 0
/// (background) stays cold. Deterministic: the same frame always produces the
/// same output.
pub struct StubBackend {
    dims: OutputDims,
    brightness_threshold: u8,
}

impl StubBackend {
    pub fn new(channels: usize) -> Self {
        Self {
            dims: OutputDims {
                height: STUB_GRID,
                width: STUB_GRID,
                channels: channels.max(2),
            },
            brightness_threshold: 128,
        }
    }

    /// Override the brightness threshold (0..=255).
    pub fn with_brightness_threshold(mut self, threshold: u8) -> Self {
        self.brightness_threshold = threshold;
        self
    }
}

impl InferenceBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn output_dims(&self) -> OutputDims {
        self.dims
    }

    fn infer(&mut self, frame: &Frame, roi: Roi) -> Result<ModelOutput> {
        let OutputDims {
            height,
            width,
            channels,
        } = self.dims;
        let mut scores = vec![0.0f32; height * width * channels];

        if frame.mean_luma(roi) >= self.brightness_threshold {
            let top = (height - HOT_BLOCK) / 2;
            let left = (width - HOT_BLOCK) / 2;
            for y in top..top + HOT_BLOCK {
                for x in left..left + HOT_BLOCK {
                    scores[(y * width + x) * channels + 1] = HOT_SCORE;
                }
            }
        }

        ModelOutput::from_nhwc(height, width, channels, scores)
    }
}
