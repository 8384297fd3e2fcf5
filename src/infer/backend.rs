use anyhow::Result;

use crate::decode::ModelOutput;
use crate::frame::{Frame, Roi};

/// Shape of a backend's heat-map output grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputDims {
    pub height: usize,
    pub width: usize,
    /// Class channels, background included. Must match the label set.
    pub channels: usize,
}

/// Inference backend trait.
///
/// Implementations treat the frame as read-only and ephemeral. The output
/// grid shape is fixed for the backend's lifetime so the pipeline can
/// validate it against the label set once, at startup.
pub trait InferenceBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Output grid shape, known before the first inference.
    fn output_dims(&self) -> OutputDims;

    /// Run inference on the ROI of one frame.
    fn infer(&mut self, frame: &Frame, roi: Roi) -> Result<ModelOutput>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
